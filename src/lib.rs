//! CargoLock — automatic two-door airlock controller core.
//!
//! The crate sequences door motion and atmosphere pressurization for a
//! cargo airlock so that at most one side is ever open to vacuum.  It is
//! pure control logic: the host supplies a periodic tick, classified
//! hardware handles (via [`ports::BindingProvider`]), and the display.
//!
//! ```text
//!  BindingProvider ──▶ ┌──────────────────────────────┐
//!                      │       AirlockController      │
//!  host tick() ───────▶│  Scheduler · Table · Procs   │──▶ Door/Vent/Light
//!                      └──────────────────────────────┘
//!                                    │
//!                                    ▼
//!                              StatusReport
//! ```

#![deny(unused_must_use)]

pub mod airlock;
pub mod config;
pub mod ports;
pub mod scheduler;
pub mod waylights;

mod error;

pub use airlock::AirlockController;
pub use airlock::status::AirlockStatus;
pub use config::AirlockConfig;
pub use error::{Error, Result};
