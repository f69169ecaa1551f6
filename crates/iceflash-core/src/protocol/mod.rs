//! Flash command sequences
//!
//! This module implements the individual command sequences (write enable,
//! status read, read, page program, erase) on top of an
//! [`SpiTransport`](crate::transport::SpiTransport), plus the
//! [`ReadyPoller`] that waits out the chip's busy state.

mod commands;
mod poller;

pub use commands::*;
pub use poller::ReadyPoller;
