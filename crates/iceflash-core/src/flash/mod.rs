//! High-level flash operations
//!
//! This module provides the sector programmer, the programming
//! orchestrator with its erase-and-retry loop, and the final whole-image
//! validator.

mod progress;
mod programmer;
mod sector;
mod validator;
mod window;

pub use progress::{NoProgress, ProgramProgress, ProgramStats};
pub use programmer::FlashProgrammer;
pub use sector::SectorProgrammer;
pub use validator::FlashValidator;
pub use window::{partition, SectorWindow};
