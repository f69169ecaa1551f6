//! Transport trait definitions

use alloc::vec::Vec;

use crate::error::TransportError;

/// Half-duplex SPI transfer primitive with explicit chip-select control
///
/// A transaction is opened implicitly by the first transfer and closed by
/// the first transfer that passes `end_transaction = true`, which releases
/// chip select. Several calls may share one transaction when an opcode and
/// its payload must appear as one continuous bus cycle:
///
/// ```ignore
/// // READ 0x000000, 16 bytes
/// transport.transmit(&[0x03, 0x00, 0x00, 0x00], false)?;
/// let data = transport.receive(16, true)?;
/// ```
///
/// Implementations must fail with [`TransportError::ShortTransfer`] when the
/// underlying layer moves fewer bytes than requested.
pub trait SpiTransport {
    /// Clock `bytes` out on MOSI
    fn transmit(&mut self, bytes: &[u8], end_transaction: bool) -> Result<(), TransportError>;

    /// Clock `count` bytes in from MISO
    fn receive(&mut self, count: usize, end_transaction: bool) -> Result<Vec<u8>, TransportError>;

    /// Block for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    fn transmit(&mut self, bytes: &[u8], end_transaction: bool) -> Result<(), TransportError> {
        (**self).transmit(bytes, end_transaction)
    }

    fn receive(&mut self, count: usize, end_transaction: bool) -> Result<Vec<u8>, TransportError> {
        (**self).receive(count, end_transaction)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

impl<T: SpiTransport + ?Sized> SpiTransport for alloc::boxed::Box<T> {
    fn transmit(&mut self, bytes: &[u8], end_transaction: bool) -> Result<(), TransportError> {
        (**self).transmit(bytes, end_transaction)
    }

    fn receive(&mut self, count: usize, end_transaction: bool) -> Result<Vec<u8>, TransportError> {
        (**self).receive(count, end_transaction)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
