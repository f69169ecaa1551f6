//! Scripted transport for unit tests

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::TransportError;
use crate::spi::Opcode;
use crate::transport::SpiTransport;

/// One recorded bus call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Transmit { bytes: Vec<u8>, end: bool },
    Receive { count: usize, end: bool },
}

/// Records every transfer and answers status reads from a script
///
/// Reads return `fill` bytes; status reads pop `statuses` and fall back to
/// `default_status` once the script is exhausted.
pub struct MockTransport {
    pub log: Vec<Transfer>,
    pub statuses: VecDeque<u8>,
    pub default_status: u8,
    pub fill: u8,
    pub status_reads: usize,
    pub delayed_us: u64,
    /// Fail every transfer from this index on
    pub fail_after: Option<usize>,
    /// Return one byte less than requested
    pub short_receive: bool,
    last_opcode: Option<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            statuses: VecDeque::new(),
            default_status: 0x00,
            fill: 0xFF,
            status_reads: 0,
            delayed_us: 0,
            fail_after: None,
            short_receive: false,
            last_opcode: None,
        }
    }

    pub fn queue_status(&mut self, statuses: &[u8]) {
        self.statuses.extend(statuses.iter().copied());
    }

    /// Bytes of every transmit, in order
    pub fn transmitted_frames(&self) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transfer::Transmit { bytes, .. } => Some(bytes.clone()),
                Transfer::Receive { .. } => None,
            })
            .collect()
    }

    /// Transmits that start an addressed command with `opcode`, as addresses
    pub fn addresses_for(&self, opcode: Opcode) -> Vec<u32> {
        self.transmitted_frames()
            .iter()
            .filter(|f| f.len() == 4 && f[0] == opcode.byte())
            .map(|f| u32::from_be_bytes([0, f[1], f[2], f[3]]))
            .collect()
    }

    fn check_fail(&self) -> Result<(), TransportError> {
        match self.fail_after {
            Some(n) if self.log.len() >= n => Err(TransportError::Bus),
            _ => Ok(()),
        }
    }
}

impl SpiTransport for MockTransport {
    fn transmit(&mut self, bytes: &[u8], end_transaction: bool) -> Result<(), TransportError> {
        self.check_fail()?;
        self.log.push(Transfer::Transmit {
            bytes: bytes.to_vec(),
            end: end_transaction,
        });
        if self.last_opcode.is_none() {
            self.last_opcode = bytes.first().copied();
        }
        if end_transaction {
            self.last_opcode = None;
        }
        Ok(())
    }

    fn receive(&mut self, count: usize, end_transaction: bool) -> Result<Vec<u8>, TransportError> {
        self.check_fail()?;
        self.log.push(Transfer::Receive {
            count,
            end: end_transaction,
        });
        let data = if self.last_opcode == Some(Opcode::ReadStatus.byte()) {
            self.status_reads += 1;
            let status = self.statuses.pop_front().unwrap_or(self.default_status);
            vec![status; count]
        } else {
            vec![self.fill; count]
        };
        if end_transaction {
            self.last_opcode = None;
        }
        if self.short_receive {
            return Ok(data[..count.saturating_sub(1)].to_vec());
        }
        Ok(data)
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += us as u64;
    }
}
