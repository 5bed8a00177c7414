//! The airlock controller.
//!
//! [`AirlockController`] wires the pieces together: it refreshes the
//! hardware binding on a fixed cadence, advances the scheduler once per
//! host tick, and keeps the sensor probes and the door-open timeout armed
//! according to the transition table.  Everything event-driven lives in
//! [`table`] and [`procedures`]; this module only owns the plumbing.

pub mod context;
pub mod procedures;
pub mod status;
pub mod table;

use log::{error, info};
use serde::Serialize;

use crate::config::AirlockConfig;
use crate::error::Result;
use crate::ports::BindingProvider;
use crate::scheduler::{ProbeHandle, Scheduler, TimerHandle};

use context::AirlockContext;
use procedures::AirlockProcedure;
use status::{AirlockStatus, StableState};
use table::{Reaction, SensorEvent};

/// One airlock instance: scheduler, shared context, and the provider that
/// rebuilds the hardware binding.
pub struct AirlockController<B: BindingProvider> {
    scheduler: Scheduler<AirlockContext, AirlockProcedure>,
    ctx: AirlockContext,
    provider: B,
    /// Probe handles in [`SensorEvent::ALL`] order.
    probes: [ProbeHandle; 3],
    /// The one-shot door-open timer and the stable state it was armed for.
    state_timer: Option<(StableState, TimerHandle)>,
    /// Ticks until the next binding refresh; zero forces one now.
    refresh_in: u64,
}

impl<B: BindingProvider> AirlockController<B> {
    /// Build a controller.  The first [`tick`](Self::tick) performs the
    /// initial hardware discovery through `provider`.
    pub fn new(config: &AirlockConfig, provider: B) -> Result<Self> {
        config.validate()?;
        let ctx = AirlockContext::new(config);
        let mut scheduler = Scheduler::new();
        let poll = ctx.timing.sensor_poll;
        let probes = [
            scheduler.add_probe(context::sensor_inside_on, context::on_inside_sensor, poll)?,
            scheduler.add_probe(context::sensor_internal_on, context::on_internal_sensor, poll)?,
            scheduler.add_probe(context::sensor_external_on, context::on_external_sensor, poll)?,
        ];
        // Probes stay dark until the first re-arm finds a stable state.
        for handle in probes {
            scheduler.set_probe_enabled(handle, false);
        }
        Ok(Self {
            scheduler,
            ctx,
            provider,
            probes,
            state_timer: None,
            refresh_in: 0,
        })
    }

    /// Advance the controller by one tick.  Call at the cadence declared
    /// by [`AirlockConfig::tick_interval_ms`].
    pub fn tick(&mut self) {
        if self.refresh_in == 0 {
            let binding = self.provider.refresh();
            info!(
                "binding refresh: group={:?}, {} ext / {} int doors, {} vents",
                binding.name,
                binding.external_doors.len(),
                binding.internal_doors.len(),
                binding.vents.len()
            );
            self.ctx.adopt_binding(binding);
            self.refresh_in = self.ctx.timing.setup_refresh;
        }
        self.refresh_in -= 1;

        self.scheduler.tick(&mut self.ctx);
        self.ctx.busy = self.scheduler.has_tasks();
        self.ctx.lights_tick();
        self.rearm();
    }

    /// Reset the sticky Error flag so automatic dispatch resumes.
    pub fn clear_error(&mut self) {
        if self.ctx.status.error {
            info!("error flag cleared by operator");
            self.ctx.status.error = false;
        }
    }

    /// Current composite status.
    pub fn status(&self) -> AirlockStatus {
        self.ctx.status
    }

    /// Snapshot for the host display.
    pub fn status_report(&self) -> StatusReport {
        let binding = &self.ctx.binding;
        StatusReport {
            name: binding.name.clone(),
            status: self.ctx.status,
            stable_state: self.ctx.status.stable_state(),
            external_doors: binding.external_doors.len(),
            internal_doors: binding.internal_doors.len(),
            vents: binding.vents.len(),
            lights: binding.lights.len(),
            has_beacon: binding.beacon.is_some(),
            inside_sensor: binding.inside_sensor.as_ref().map(|s| s.is_active()),
            internal_sensor: binding.internal_sensor.as_ref().map(|s| s.is_active()),
            external_sensor: binding.external_sensor.as_ref().map(|s| s.is_active()),
            tick: self.scheduler.now(),
        }
    }

    /// Bring the probes and the door-open timer in line with the current
    /// stable state.
    ///
    /// While a procedure runs, the Error flag is set, or an axis is in
    /// motion, every probe is dark and the timer is cancelled.  Otherwise
    /// each probe is enabled exactly when the table has an entry for its
    /// event, and the timer is (re)armed whenever the stable state changed.
    fn rearm(&mut self) {
        let state = if self.ctx.busy || self.ctx.status.error {
            None
        } else {
            self.ctx.status.stable_state()
        };

        for (event, handle) in SensorEvent::ALL.into_iter().zip(self.probes) {
            let enabled =
                state.is_some_and(|s| table::reaction(s, event) != Reaction::Unhandled);
            self.scheduler.set_probe_enabled(handle, enabled);
        }

        let wanted = state.filter(|s| table::state_timeout(*s).is_some());
        match (wanted, self.state_timer) {
            (Some(s), Some((armed, _))) if armed == s => {}
            (Some(s), previous) => {
                if let Some((_, handle)) = previous {
                    self.scheduler.cancel_timer(handle);
                }
                let delay = self.ctx.timing.door_open_timeout;
                match self.scheduler.set_timeout(delay, context::on_state_timeout) {
                    Ok(handle) => self.state_timer = Some((s, handle)),
                    Err(e) => {
                        error!("failed to arm door-open timer: {e}");
                        self.state_timer = None;
                    }
                }
            }
            (None, Some((_, handle))) => {
                self.scheduler.cancel_timer(handle);
                self.state_timer = None;
            }
            (None, None) => {}
        }
    }
}

/// Display snapshot produced by [`AirlockController::status_report`].
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Block group name, when discovery found one.
    pub name: Option<String>,
    pub status: AirlockStatus,
    pub stable_state: Option<StableState>,
    pub external_doors: usize,
    pub internal_doors: usize,
    pub vents: usize,
    pub lights: usize,
    pub has_beacon: bool,
    /// Live sensor levels; `None` where the sensor is absent.
    pub inside_sensor: Option<bool>,
    pub internal_sensor: Option<bool>,
    pub external_sensor: Option<bool>,
    pub tick: u64,
}
