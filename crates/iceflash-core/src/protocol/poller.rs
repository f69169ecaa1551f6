//! Busy polling

use crate::error::{Error, PendingOp, Result};
use crate::geometry::FlashGeometry;
use crate::transport::SpiTransport;

use super::commands::read_status;

/// Waits for the flash to clear its busy bit
///
/// Erase and program commands run asynchronously inside the chip; nothing
/// but a status read may be issued until the busy bit clears. Elapsed time
/// is the sum of the poll delays requested from the transport. Bus time
/// spent on the status reads themselves is not counted, so on a slow
/// transport the wall-clock wait can be well above the timeout: every poll
/// adds one status transfer on top of its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPoller {
    interval_ms: u32,
    timeout_ms: u32,
}

impl ReadyPoller {
    /// Create a poller with an explicit interval and timeout
    pub const fn new(interval_ms: u32, timeout_ms: u32) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    /// Poller for page program and sector erase
    pub const fn for_program(geometry: &FlashGeometry) -> Self {
        Self::new(geometry.ready_poll_interval_ms, geometry.ready_poll_timeout_ms)
    }

    /// Poller for chip erase
    pub const fn for_chip_erase(geometry: &FlashGeometry) -> Self {
        Self::new(geometry.ready_poll_interval_ms, geometry.chip_erase_timeout_ms)
    }

    /// Poll interval in milliseconds
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Timeout in milliseconds
    pub const fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Poll the status register until the flash is ready
    ///
    /// `op` and `address` describe the command being waited on and are only
    /// used for the error report. Transport failures abort immediately.
    pub fn wait_ready<T: SpiTransport + ?Sized>(
        &self,
        transport: &mut T,
        op: PendingOp,
        address: u32,
    ) -> Result<()> {
        let mut waited_ms: u32 = 0;

        loop {
            if read_status(transport)?.is_ready() {
                if waited_ms > 0 {
                    log::trace!("{} at 0x{:06X} done after {} ms", op, address, waited_ms);
                }
                return Ok(());
            }

            if waited_ms >= self.timeout_ms {
                log::error!(
                    "Flash still busy after {} ms ({} at 0x{:06X})",
                    waited_ms,
                    op,
                    address
                );
                return Err(Error::Timeout {
                    op,
                    address,
                    waited_ms,
                });
            }

            transport.delay_us(self.interval_ms.saturating_mul(1000));
            waited_ms = waited_ms.saturating_add(self.interval_ms);
        }
    }
}
