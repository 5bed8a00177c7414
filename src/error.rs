//! Unified error types for the airlock controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! host's error handling uniform.  All variants are `Copy` so they can be
//! passed around without allocation.

use core::fmt;

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid.  The string names the offending field.
    Config(&'static str),
    /// All timer slots are occupied.
    TimerSlotsFull,
    /// All probe slots are occupied.
    ProbeSlotsFull,
    /// The task queue is at capacity.
    TaskQueueFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::TimerSlotsFull => write!(f, "scheduler: timer slots full"),
            Self::ProbeSlotsFull => write!(f, "scheduler: probe slots full"),
            Self::TaskQueueFull => write!(f, "scheduler: task queue full"),
        }
    }
}

impl core::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
