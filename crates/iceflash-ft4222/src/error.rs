//! Error types for the FT4222 transport

use iceflash_core::error::TransportError;
use thiserror::Error;

/// Result type for FT4222 operations
pub type Result<T> = std::result::Result<T, Ft4222Error>;

/// Errors that can occur when using the FT4222 bridge
#[derive(Debug, Error)]
pub enum Ft4222Error {
    /// No FT4222H on the bus
    #[error("FT4222H device not found (VID:0403 PID:601c)")]
    DeviceNotFound,
    /// Failed to open device
    #[error("failed to open FT4222H: {0}")]
    OpenFailed(String),
    /// Failed to claim interface
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),
    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),
    /// Invalid response from device
    #[error("invalid response from FT4222H: {0}")]
    InvalidResponse(String),
    /// Fewer bytes moved than requested
    #[error("short transfer: {transferred} of {requested} byte(s)")]
    ShortTransfer {
        /// Bytes requested
        requested: usize,
        /// Bytes actually moved
        transferred: usize,
    },
}

impl From<nusb::Error> for Ft4222Error {
    fn from(e: nusb::Error) -> Self {
        Ft4222Error::TransferFailed(e.to_string())
    }
}

impl From<Ft4222Error> for TransportError {
    fn from(e: Ft4222Error) -> Self {
        match e {
            Ft4222Error::ShortTransfer {
                requested,
                transferred,
            } => TransportError::ShortTransfer {
                requested,
                transferred,
            },
            other => {
                log::error!("FT4222: {}", other);
                TransportError::Bus
            }
        }
    }
}
