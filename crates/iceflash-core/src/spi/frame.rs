//! Command frame: opcode plus optional address

use alloc::vec::Vec;
use core::ops::Deref;

use super::address::{encode_address, ADDRESS_BYTES};
use super::opcodes::Opcode;

/// Bytes of one command header as transmitted on the bus
///
/// Payload bytes (page data) are sent as a separate transfer inside the same
/// transaction, so a frame only ever holds the opcode and the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// A bare opcode frame (status, write enable, chip erase, wake up)
    pub fn command(opcode: Opcode) -> Self {
        Self {
            bytes: alloc::vec![opcode.byte()],
        }
    }

    /// An opcode followed by a 3-byte big-endian address
    pub fn addressed(opcode: Opcode, address: u32) -> Self {
        let mut bytes = Vec::with_capacity(1 + ADDRESS_BYTES);
        bytes.push(opcode.byte());
        bytes.extend_from_slice(&encode_address(address));
        Self { bytes }
    }

    /// The raw bytes of the frame
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_frame() {
        assert_eq!(Frame::command(Opcode::WriteEnable).as_bytes(), &[0x06]);
        assert_eq!(Frame::command(Opcode::WakeUp).as_bytes(), &[0xAB]);
    }

    #[test]
    fn test_addressed_frame() {
        let frame = Frame::addressed(Opcode::PageProgram, 0x001F00);
        assert_eq!(frame.as_bytes(), &[0x02, 0x00, 0x1F, 0x00]);

        let frame = Frame::addressed(Opcode::Read, 0xABCDEF);
        assert_eq!(&*frame, &[0x03, 0xAB, 0xCD, 0xEF]);
    }
}
