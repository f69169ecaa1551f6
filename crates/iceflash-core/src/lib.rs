//! iceflash-core - SPI NOR flash programming protocol
//!
//! This crate implements the command framing, busy polling and the
//! erase/program/verify/retry loop used to put a file image onto a serial
//! NOR flash chip. It never touches hardware directly: every bus access goes
//! through the [`transport::SpiTransport`] trait, so the same code drives a
//! real USB-SPI bridge or the in-memory emulator used by the tests.
//!
//! # Features
//!
//! - `std` - Enable `std::error::Error` impls and TOML geometry loading
//!
//! # Example
//!
//! ```ignore
//! use iceflash_core::flash::FlashProgrammer;
//! use iceflash_core::geometry::FlashGeometry;
//!
//! fn flash<T: SpiTransport>(transport: T, image: &[u8]) -> iceflash_core::Result<()> {
//!     let mut programmer = FlashProgrammer::new(transport, FlashGeometry::default())?;
//!     programmer.wake_up()?;
//!     programmer.erase_chip()?;
//!     programmer.program(image)?;
//!     programmer.validate(image)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod flash;
pub mod geometry;
pub mod protocol;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod mock;

pub use error::{Error, Result};
