//! SPI framing for the target flash family
//!
//! This module provides the opcode table, 24-bit address encoding and the
//! [`Frame`] type that is actually put on the bus.

mod address;
mod frame;
pub mod opcodes;

pub use address::{check_access, encode_address, ADDRESS_BYTES, MAX_ADDRESSABLE};
pub use frame::Frame;
pub use opcodes::{Opcode, StatusFlags};
