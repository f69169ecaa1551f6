//! Error types for iceflash-core
//!
//! The core error is `Copy` and `no_std` compatible so it can be carried
//! through every layer of the protocol without allocation.

use core::fmt;

/// Failure reported by an [`SpiTransport`](crate::transport::SpiTransport)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying layer moved fewer bytes than requested
    ShortTransfer {
        /// Bytes the caller asked for
        requested: usize,
        /// Bytes actually transferred
        transferred: usize,
    },
    /// Device or bus failure reported by the physical layer
    Bus,
}

/// Flash operation that leaves the chip busy until it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Page program
    PageProgram,
    /// Sector erase
    SectorErase,
    /// Whole chip erase
    ChipErase,
}

/// Input rejected before any bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    /// The image has no bytes
    EmptyImage,
    /// The image does not fit in the flash
    ImageTooLarge {
        /// Image length in bytes
        len: usize,
        /// Flash capacity in bytes
        capacity: u32,
    },
    /// A sector buffer is larger than one sector
    SectorTooLarge {
        /// Buffer length in bytes
        len: usize,
        /// Sector size in bytes
        max: u32,
    },
    /// An access would run past the end of the flash
    AddressOutOfRange {
        /// Start address of the access
        address: u32,
        /// Access length in bytes
        len: usize,
        /// Flash capacity in bytes
        capacity: u32,
    },
    /// The flash geometry violates one of its invariants
    InvalidGeometry(&'static str),
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Transport failure; never retried
    Transport(TransportError),
    /// The flash did not report ready in time
    Timeout {
        /// Operation the flash was busy with
        op: PendingOp,
        /// Address the operation targeted
        address: u32,
        /// Total time spent polling
        waited_ms: u32,
    },
    /// Read-back did not match the source image
    CorruptedUpload {
        /// Sector that could not be programmed, `None` for the whole-image check
        sector: Option<u32>,
        /// Number of mismatching bytes in the last comparison
        mismatches: usize,
        /// Image offset of the first mismatching byte
        first_mismatch: Option<u32>,
    },
    /// Caller supplied invalid input
    InvalidInput(InvalidInput),
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<InvalidInput> for Error {
    fn from(e: InvalidInput) -> Self {
        Error::InvalidInput(e)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortTransfer {
                requested,
                transferred,
            } => write!(
                f,
                "short transfer: {} of {} bytes",
                transferred, requested
            ),
            Self::Bus => write!(f, "device or bus failure"),
        }
    }
}

impl fmt::Display for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageProgram => write!(f, "page program"),
            Self::SectorErase => write!(f, "sector erase"),
            Self::ChipErase => write!(f, "chip erase"),
        }
    }
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image is empty"),
            Self::ImageTooLarge { len, capacity } => write!(
                f,
                "image of {} bytes exceeds flash capacity of {} bytes",
                len, capacity
            ),
            Self::SectorTooLarge { len, max } => {
                write!(f, "sector buffer of {} bytes exceeds {} bytes", len, max)
            }
            Self::AddressOutOfRange {
                address,
                len,
                capacity,
            } => write!(
                f,
                "access of {} bytes at 0x{:06X} exceeds flash capacity of {} bytes",
                len, address, capacity
            ),
            Self::InvalidGeometry(reason) => write!(f, "invalid flash geometry: {}", reason),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Timeout {
                op,
                address,
                waited_ms,
            } => write!(
                f,
                "flash still busy after {} ms ({} at 0x{:06X})",
                waited_ms, op, address
            ),
            Self::CorruptedUpload {
                sector,
                mismatches,
                first_mismatch,
            } => {
                match sector {
                    Some(sector) => write!(f, "corrupted upload in sector {}", sector)?,
                    None => write!(f, "corrupted upload")?,
                }
                write!(f, ": {} byte(s) differ", mismatches)?;
                if let Some(offset) = first_mismatch {
                    write!(f, ", first at offset 0x{:06X}", offset)?;
                }
                Ok(())
            }
            Self::InvalidInput(e) => write!(f, "invalid input: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
