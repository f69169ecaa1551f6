//! Transport abstraction
//!
//! This module defines the half-duplex byte transfer primitive that every
//! programmer backend must implement.

mod traits;

pub use traits::*;
