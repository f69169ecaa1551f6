//! Flash geometry
//!
//! Constant parameters of the target chip that drive all buffer splitting.
//! They are configuration, not discovered from the chip's ID registers.
//!
//! Geometries can be built in code or, with the `std` feature, loaded from a
//! TOML file:
//!
//! ```toml
//! [geometry]
//! page_size = 256
//! sector_size = "4 KiB"
//! capacity = "16 MiB"
//! max_program_attempts = 5
//! ```

#[cfg(feature = "std")]
mod toml;

#[cfg(feature = "std")]
pub use self::toml::GeometryError;

use crate::error::{Error, InvalidInput, Result};
use crate::spi::MAX_ADDRESSABLE;

/// Default page size (bytes)
pub const DEFAULT_PAGE_SIZE: u32 = 256;
/// Default sector size (bytes)
pub const DEFAULT_SECTOR_SIZE: u32 = 4096;
/// Default flash capacity (bytes)
pub const DEFAULT_CAPACITY: u32 = 16 * 1024 * 1024;
/// Default largest single read transfer (bytes)
pub const DEFAULT_MAX_READ_CHUNK: u32 = 32 * 1024;
/// Default number of program attempts per sector
pub const DEFAULT_MAX_PROGRAM_ATTEMPTS: u32 = 5;
/// Default delay between status polls
pub const DEFAULT_READY_POLL_INTERVAL_MS: u32 = 1;
/// Default busy timeout after a page program or sector erase
pub const DEFAULT_READY_POLL_TIMEOUT_MS: u32 = 1000;
/// Default busy timeout after a chip erase (typical 25-100s on 16 MiB parts)
pub const DEFAULT_CHIP_ERASE_TIMEOUT_MS: u32 = 200_000;

/// Physical and timing parameters of the flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Largest single program-write granularity
    pub page_size: u32,
    /// Erase granularity; a multiple of `page_size`
    pub sector_size: u32,
    /// Total addressable size of the chip
    pub capacity: u32,
    /// Largest number of bytes read in one transfer
    pub max_read_chunk: u32,
    /// Program attempts per sector before giving up
    pub max_program_attempts: u32,
    /// Delay between status register polls
    pub ready_poll_interval_ms: u32,
    /// How long to poll after a page program or sector erase
    pub ready_poll_timeout_ms: u32,
    /// How long to poll after a chip erase
    pub chip_erase_timeout_ms: u32,
}

impl Default for FlashGeometry {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            sector_size: DEFAULT_SECTOR_SIZE,
            capacity: DEFAULT_CAPACITY,
            max_read_chunk: DEFAULT_MAX_READ_CHUNK,
            max_program_attempts: DEFAULT_MAX_PROGRAM_ATTEMPTS,
            ready_poll_interval_ms: DEFAULT_READY_POLL_INTERVAL_MS,
            ready_poll_timeout_ms: DEFAULT_READY_POLL_TIMEOUT_MS,
            chip_erase_timeout_ms: DEFAULT_CHIP_ERASE_TIMEOUT_MS,
        }
    }
}

impl FlashGeometry {
    /// Check the geometry invariants
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &'static str| -> Result<()> {
            Err(Error::InvalidInput(InvalidInput::InvalidGeometry(reason)))
        };

        if self.page_size == 0 {
            return invalid("page size must be non-zero");
        }
        if self.sector_size == 0 || self.sector_size % self.page_size != 0 {
            return invalid("sector size must be a non-zero multiple of the page size");
        }
        if self.capacity == 0 || self.capacity % self.sector_size != 0 {
            return invalid("capacity must be a non-zero multiple of the sector size");
        }
        if self.capacity > MAX_ADDRESSABLE {
            return invalid("capacity exceeds the 24-bit address space");
        }
        if self.max_read_chunk == 0 {
            return invalid("max read chunk must be non-zero");
        }
        if self.sector_size > self.max_read_chunk {
            return invalid("sector size must not exceed the max read chunk");
        }
        if self.max_program_attempts == 0 {
            return invalid("at least one program attempt is required");
        }
        if self.ready_poll_interval_ms == 0 {
            return invalid("poll interval must be at least 1 ms");
        }
        if self.ready_poll_timeout_ms < self.ready_poll_interval_ms
            || self.chip_erase_timeout_ms < self.ready_poll_interval_ms
        {
            return invalid("poll timeouts must not be shorter than the poll interval");
        }
        Ok(())
    }

    /// Number of pages in one sector
    pub const fn pages_per_sector(&self) -> u32 {
        self.sector_size / self.page_size
    }

    /// Number of sectors needed to hold `len` bytes
    pub const fn sector_count(&self, len: usize) -> usize {
        len.div_ceil(self.sector_size as usize)
    }

    /// Start address of a sector
    pub const fn sector_address(&self, sector: u32) -> u32 {
        sector * self.sector_size
    }

    /// Start address of a page within a sector
    pub const fn page_address(&self, sector: u32, page: u32) -> u32 {
        (sector * self.pages_per_sector() + page) * self.page_size
    }
}
