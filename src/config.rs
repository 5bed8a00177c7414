//! System configuration parameters
//!
//! All tunable parameters for the airlock controller.  Durations are given
//! in wall-clock units and converted to scheduler ticks through
//! `tick_interval_ms`, which must match the cadence at which the host calls
//! [`AirlockController::tick`](crate::AirlockController::tick).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core airlock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlockConfig {
    // --- Timing ---
    /// Duration of one scheduler tick (milliseconds).
    pub tick_interval_ms: u32,
    /// Interval between hardware binding refreshes (seconds).
    pub setup_refresh_secs: u16,
    /// How long a door may stay open before it is closed automatically (seconds).
    pub door_open_timeout_secs: u16,
    /// Maximum time any commanded action may take before Error is raised (seconds).
    pub action_timeout_secs: u16,
    /// Sensor probe sample interval (milliseconds).
    pub sensor_poll_ms: u32,

    // --- Way-lights ---
    /// Interval between chase advances (milliseconds).
    pub chase_interval_ms: u32,
    /// Number of simultaneously lit chase fixtures.
    pub chase_lit_count: u8,
    /// Distance gap (grid units) that splits lights into separate lines.
    pub light_line_gap: i32,
}

impl Default for AirlockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            setup_refresh_secs: 15,
            door_open_timeout_secs: 5,
            action_timeout_secs: 30,
            sensor_poll_ms: 100,

            chase_interval_ms: 100,
            chase_lit_count: 3,
            light_line_gap: 3,
        }
    }
}

impl AirlockConfig {
    /// Range-check the configuration.  Invalid values are rejected, not
    /// clamped, so a broken host config cannot silently disable timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0"));
        }
        if self.setup_refresh_secs == 0 {
            return Err(Error::Config("setup_refresh_secs must be > 0"));
        }
        if self.action_timeout_secs == 0 {
            return Err(Error::Config("action_timeout_secs must be > 0"));
        }
        if self.chase_lit_count == 0 {
            return Err(Error::Config("chase_lit_count must be > 0"));
        }
        if self.light_line_gap <= 0 {
            return Err(Error::Config("light_line_gap must be > 0"));
        }
        Ok(())
    }

    /// Convert a second count to scheduler ticks (at least one tick).
    pub fn ticks_from_secs(&self, secs: u16) -> u64 {
        self.ticks_from_ms(u64::from(secs) * 1000)
    }

    /// Convert a millisecond count to scheduler ticks (at least one tick).
    pub fn ticks_from_ms(&self, ms: u64) -> u64 {
        (ms / u64::from(self.tick_interval_ms)).max(1)
    }
}
