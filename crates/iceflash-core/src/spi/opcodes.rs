//! Fixed command set of the target flash family
//!
//! The IceBoard flash is a W25Q-class part; only the commands the
//! programmer needs are listed here.

use bitflags::bitflags;

/// Command opcodes understood by the flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Read Status Register 1
    ReadStatus = 0x05,
    /// Write Enable - sets the WEL latch, required before program/erase
    WriteEnable = 0x06,
    /// Page Program (3-byte address)
    PageProgram = 0x02,
    /// 4 KiB Sector Erase (3-byte address)
    SectorErase = 0x20,
    /// Chip Erase
    ChipErase = 0xC7,
    /// Read Data (3-byte address)
    Read = 0x03,
    /// Release from Deep Power-Down
    WakeUp = 0xAB,
}

impl Opcode {
    /// Every opcode in the command set
    pub const ALL: [Opcode; 7] = [
        Opcode::ReadStatus,
        Opcode::WriteEnable,
        Opcode::PageProgram,
        Opcode::SectorErase,
        Opcode::ChipErase,
        Opcode::Read,
        Opcode::WakeUp,
    ];

    /// The byte sent on the bus
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Look up an opcode from its bus byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.byte() == byte)
    }

    /// Whether the command carries a 3-byte address after the opcode
    pub const fn has_address(self) -> bool {
        matches!(self, Self::PageProgram | Self::SectorErase | Self::Read)
    }
}

bitflags! {
    /// Status register 1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Write In Progress - erase or program still running
        const BUSY = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
    }
}

impl StatusFlags {
    /// Whether the chip is ready to accept a new command
    pub fn is_ready(self) -> bool {
        !self.contains(Self::BUSY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.byte()), Some(op));
        }
        assert_eq!(Opcode::from_byte(0x9F), None);
    }

    #[test]
    fn test_status_ready() {
        assert!(StatusFlags::from_bits_retain(0x00).is_ready());
        assert!(StatusFlags::from_bits_retain(0x02).is_ready());
        assert!(!StatusFlags::from_bits_retain(0x01).is_ready());
        assert!(!StatusFlags::from_bits_retain(0xFF).is_ready());
    }
}
