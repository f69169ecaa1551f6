//! iceflash-ft4222 - FT4222H USB SPI transport
//!
//! This crate drives the FTDI FT4222H USB to SPI bridge found on the
//! IceBoard and exposes it as an [`SpiTransport`]. It talks to the chip
//! over raw USB with `nusb`; LibFT4222 is not needed.
//!
//! # Configuration
//!
//! The bridge is always configured the same way, matching the board wiring:
//!
//! - 60 MHz system clock divided by 2 (30 MHz SPI clock)
//! - single I/O, SPI master
//! - clock idle high, data captured on the trailing edge
//! - CS0, active low
//!
//! Only the first FT4222H found on the bus is used.
//!
//! # Chip select
//!
//! CS stays asserted across `transmit`/`receive` calls until one of them is
//! made with `end_transaction` set, at which point a zero-length bulk
//! packet releases it.
//!
//! # Example
//!
//! ```no_run
//! use iceflash_core::flash::FlashProgrammer;
//! use iceflash_core::geometry::FlashGeometry;
//! use iceflash_ft4222::Ft4222;
//!
//! let ft4222 = Ft4222::open()?;
//! let mut programmer = FlashProgrammer::new(ft4222, FlashGeometry::default())?;
//! programmer.wake_up()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`SpiTransport`]: iceflash_core::transport::SpiTransport

mod device;
mod error;
mod protocol;

pub use device::{Ft4222, Ft4222DeviceInfo};
pub use error::{Ft4222Error, Result};
pub use protocol::ICEBOARD_SPI_CLOCK_KHZ;
