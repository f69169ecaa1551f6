//! 24-bit address encoding

use crate::error::InvalidInput;

/// Number of address bytes following an addressed opcode
pub const ADDRESS_BYTES: usize = 3;

/// Size of the 3-byte address space (16 MiB)
pub const MAX_ADDRESSABLE: u32 = 1 << 24;

/// Encode an address as 3 bytes, most significant first
///
/// Bits above 24 are dropped; callers keep addresses below
/// [`MAX_ADDRESSABLE`].
pub const fn encode_address(address: u32) -> [u8; ADDRESS_BYTES] {
    [(address >> 16) as u8, (address >> 8) as u8, address as u8]
}

/// Check that `len` bytes starting at `address` fit inside `capacity`
pub fn check_access(address: u32, len: usize, capacity: u32) -> Result<(), InvalidInput> {
    let end = address as u64 + len as u64;
    if end > capacity as u64 {
        return Err(InvalidInput::AddressOutOfRange {
            address,
            len,
            capacity,
        });
    }
    Ok(())
}
