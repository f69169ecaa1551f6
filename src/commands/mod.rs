//! CLI command implementations
//!
//! The only real command is a flash session: wake the chip, erase it,
//! program the image and read it back. Each stage reports failures as a
//! [`StageError`] so the user can tell where the session stopped.

pub mod flash;
mod list;
mod progress;

use std::fmt;
use std::path::PathBuf;

use iceflash_core::geometry::GeometryError;
use thiserror::Error;

pub use list::list_programmers;
pub use progress::IndicatifProgress;

/// Stage of a flash session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Setting up the programmer with the geometry
    Setup,
    /// Releasing the chip from deep power-down
    Wake,
    /// Chip erase
    Erase,
    /// Program and per-sector verify
    Program,
    /// Full read-back
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Setup => "setup",
            Stage::Wake => "wake-up",
            Stage::Erase => "erase",
            Stage::Program => "program",
            Stage::Validate => "validate",
        })
    }
}

/// A core error tagged with the stage that produced it
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    /// Where the session stopped
    pub stage: Stage,
    /// What went wrong
    #[source]
    pub source: iceflash_core::Error,
}

/// Errors reported by the command line tool
#[derive(Debug, Error)]
pub enum CliError {
    /// The image file could not be read
    #[error("failed to read image {path:?}: {source}")]
    Image {
        /// Image path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The image file has no content
    #[error("image {0:?} is empty")]
    EmptyImage(PathBuf),
    /// The geometry file is unusable
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// No programmer with that name
    #[error("unknown programmer: {name}\n\n{help}")]
    UnknownProgrammer {
        /// Name given on the command line
        name: String,
        /// List of available programmers
        help: String,
    },
    /// The programmer could not be opened
    #[error("failed to open {programmer}: {source}")]
    Open {
        /// Programmer name
        programmer: &'static str,
        /// Driver error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A session stage failed
    #[error(transparent)]
    Stage(#[from] StageError),
}
