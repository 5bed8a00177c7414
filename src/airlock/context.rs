//! Shared mutable context threaded through every procedure and callback.
//!
//! `AirlockContext` is the blackboard: it owns the composite status, the
//! live hardware binding, the way-light sequencer, and the tick-converted
//! timing parameters.  Procedures read sensor predicates from it and write
//! status/actuator commands through it; the controller re-derives the
//! status from hardware and keeps the dispatch guard in sync.

use log::{info, warn};

use crate::config::AirlockConfig;
use crate::ports::{Door, DoorState, HardwareBinding, Vent, VentState};
use crate::waylights::{ChaseDirection, WayLightSequencer};

use super::procedures::AirlockProcedure;
use super::status::{AirPhase, AirlockStatus, DoorPhase};
use super::table::{self, Reaction, SensorEvent};

/// Which door axis a command or predicate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorSide {
    External,
    Internal,
}

/// Durations converted to scheduler ticks once at construction.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub action_timeout: u64,
    pub door_open_timeout: u64,
    pub setup_refresh: u64,
    pub sensor_poll: u64,
}

impl Timing {
    pub fn from_config(config: &AirlockConfig) -> Self {
        Self {
            action_timeout: config.ticks_from_secs(config.action_timeout_secs),
            door_open_timeout: config.ticks_from_secs(config.door_open_timeout_secs),
            setup_refresh: config.ticks_from_secs(config.setup_refresh_secs),
            sensor_poll: config.ticks_from_ms(u64::from(config.sensor_poll_ms)),
        }
    }
}

// ---------------------------------------------------------------------------
// AirlockContext
// ---------------------------------------------------------------------------

pub struct AirlockContext {
    pub status: AirlockStatus,
    pub binding: HardwareBinding,
    pub lights: WayLightSequencer,
    pub timing: Timing,
    /// Dispatch guard: true while a procedure is queued or running.  The
    /// first table entry to dispatch in a tick sets it, so later events in
    /// the same tick (probes fire after timers) are suppressed.
    pub(crate) busy: bool,
}

impl AirlockContext {
    pub fn new(config: &AirlockConfig) -> Self {
        Self {
            status: AirlockStatus::default(),
            binding: HardwareBinding::empty(),
            lights: WayLightSequencer::new(config),
            timing: Timing::from_config(config),
            busy: false,
        }
    }

    // ── Binding lifecycle ─────────────────────────────────────

    /// Replace the hardware binding wholesale and re-derive the status
    /// axes from what the new blocks report.
    pub fn adopt_binding(&mut self, binding: HardwareBinding) {
        self.binding = binding;
        let centroid = self.binding.external_door_centroid();
        self.lights.rebind(&self.binding.lights, centroid);
        self.rederive();
    }

    /// Collapse each axis to a settled value when the blocks agree.
    ///
    /// Disagreement resolves to Unknown unless a commanded motion is in
    /// progress; missing hardware always resolves to Unknown.  Never
    /// touches the Error flag.
    pub fn rederive(&mut self) {
        let derived = derive_doors(&self.binding.external_doors);
        if let Some(phase) = resolve_axis(derived, self.status.external_door) {
            self.set_door_phase(DoorSide::External, phase);
        }
        let derived = derive_doors(&self.binding.internal_doors);
        if let Some(phase) = resolve_axis(derived, self.status.internal_door) {
            self.set_door_phase(DoorSide::Internal, phase);
        }
        let derived = derive_air(&self.binding.vents);
        if let Some(phase) = resolve_air(derived, self.status.air) {
            self.set_air_phase(phase);
        }
    }

    // ── Status mutation ───────────────────────────────────────

    pub fn set_door_phase(&mut self, side: DoorSide, phase: DoorPhase) {
        let axis = match side {
            DoorSide::External => &mut self.status.external_door,
            DoorSide::Internal => &mut self.status.internal_door,
        };
        if *axis != phase {
            info!("{side:?} door: {:?} -> {phase:?}", *axis);
            *axis = phase;
        }
    }

    pub fn set_air_phase(&mut self, phase: AirPhase) {
        if self.status.air != phase {
            info!("air: {:?} -> {phase:?}", self.status.air);
            self.status.air = phase;
        }
    }

    /// Raise the sticky Error flag.
    pub fn set_error(&mut self) {
        if !self.status.error {
            warn!("airlock fault: status = {:?}", self.status);
            self.status.error = true;
        }
    }

    // ── Actuator commands ─────────────────────────────────────

    pub fn command_doors(&mut self, side: DoorSide, open: bool) {
        let doors = match side {
            DoorSide::External => &mut self.binding.external_doors,
            DoorSide::Internal => &mut self.binding.internal_doors,
        };
        for door in doors {
            if open {
                door.open();
            } else {
                door.close();
            }
        }
    }

    pub fn command_vents(&mut self, depressurize: bool) {
        for vent in &mut self.binding.vents {
            vent.set_depressurize(depressurize);
        }
    }

    pub fn set_beacon(&mut self, on: bool) {
        if let Some(beacon) = &mut self.binding.beacon {
            beacon.set_enabled(on);
        }
    }

    // ── Way-lights ────────────────────────────────────────────

    pub fn lights_start(&mut self, direction: ChaseDirection) {
        self.lights.start(direction);
    }

    pub fn lights_stop(&mut self) {
        self.lights.stop(&mut self.binding.lights);
    }

    /// Advance the chase animation by one tick.
    pub fn lights_tick(&mut self) {
        self.lights.tick(&mut self.binding.lights);
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Look up the table reaction for a sensor edge in the current stable
    /// state.  At most one procedure dispatches per tick; Error suppresses
    /// dispatch entirely.
    pub(crate) fn dispatch_event(&mut self, event: SensorEvent) -> Option<AirlockProcedure> {
        if self.busy || self.status.error {
            return None;
        }
        let state = self.status.stable_state()?;
        match table::reaction(state, event) {
            Reaction::Run(kind) => {
                info!("{state:?}: {event:?} sensor -> {kind:?}");
                self.busy = true;
                Some(AirlockProcedure::from_kind(kind))
            }
            Reaction::Ignore | Reaction::Unhandled => None,
        }
    }

    /// Dispatch the state-timeout procedure, if the table has one.
    pub(crate) fn dispatch_timeout(&mut self) -> Option<AirlockProcedure> {
        if self.busy || self.status.error {
            return None;
        }
        let state = self.status.stable_state()?;
        let kind = table::state_timeout(state)?;
        info!("{state:?}: door-open timeout -> {kind:?}");
        self.busy = true;
        Some(AirlockProcedure::from_kind(kind))
    }
}

// ---------------------------------------------------------------------------
// Axis derivation
// ---------------------------------------------------------------------------

enum Derived<T> {
    /// Every block on the axis reports the same settled value.
    Agreed(T),
    /// Blocks disagree or are mid-motion.
    Mixed,
    /// No blocks bound for this axis.
    Absent,
}

fn derive_doors(doors: &[Box<dyn Door>]) -> Derived<DoorPhase> {
    if doors.is_empty() {
        return Derived::Absent;
    }
    if doors.iter().all(|d| d.state() == DoorState::Closed) {
        Derived::Agreed(DoorPhase::Closed)
    } else if doors.iter().all(|d| d.state() == DoorState::Open) {
        Derived::Agreed(DoorPhase::Open)
    } else {
        Derived::Mixed
    }
}

fn derive_air(vents: &[Box<dyn Vent>]) -> Derived<AirPhase> {
    if vents.is_empty() {
        return Derived::Absent;
    }
    if vents.iter().all(|v| vent_depressurized(v.as_ref())) {
        Derived::Agreed(AirPhase::Depressurized)
    } else if vents.iter().all(|v| vent_pressurized(v.as_ref())) {
        Derived::Agreed(AirPhase::Pressurized)
    } else {
        Derived::Mixed
    }
}

fn resolve_axis(derived: Derived<DoorPhase>, current: DoorPhase) -> Option<DoorPhase> {
    match derived {
        Derived::Agreed(phase) if phase != current => Some(phase),
        Derived::Agreed(_) => None,
        // A commanded motion in progress is not stomped by a mixed read.
        Derived::Mixed if current.is_transitional() => None,
        Derived::Mixed | Derived::Absent => {
            (current != DoorPhase::Unknown).then_some(DoorPhase::Unknown)
        }
    }
}

fn resolve_air(derived: Derived<AirPhase>, current: AirPhase) -> Option<AirPhase> {
    match derived {
        Derived::Agreed(phase) if phase != current => Some(phase),
        Derived::Agreed(_) => None,
        Derived::Mixed if current.is_transitional() => None,
        Derived::Mixed | Derived::Absent => {
            (current != AirPhase::Unknown).then_some(AirPhase::Unknown)
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates (plain fns for scheduler probes and procedure waits)
// ---------------------------------------------------------------------------

fn vent_pressurized(vent: &dyn Vent) -> bool {
    vent.state() == Some(VentState::Pressurized) || vent.oxygen_level() > 0.99
}

fn vent_depressurized(vent: &dyn Vent) -> bool {
    vent.state() == Some(VentState::Depressurized) || vent.oxygen_level() < 0.01
}

fn doors_all(doors: &[Box<dyn Door>], state: DoorState) -> bool {
    !doors.is_empty() && doors.iter().all(|d| d.state() == state)
}

pub(crate) fn external_doors_open(ctx: &AirlockContext) -> bool {
    doors_all(&ctx.binding.external_doors, DoorState::Open)
}

pub(crate) fn external_doors_closed(ctx: &AirlockContext) -> bool {
    doors_all(&ctx.binding.external_doors, DoorState::Closed)
}

pub(crate) fn internal_doors_open(ctx: &AirlockContext) -> bool {
    doors_all(&ctx.binding.internal_doors, DoorState::Open)
}

pub(crate) fn internal_doors_closed(ctx: &AirlockContext) -> bool {
    doors_all(&ctx.binding.internal_doors, DoorState::Closed)
}

pub(crate) fn vents_pressurized(ctx: &AirlockContext) -> bool {
    !ctx.binding.vents.is_empty()
        && ctx.binding.vents.iter().all(|v| vent_pressurized(v.as_ref()))
}

pub(crate) fn vents_depressurized(ctx: &AirlockContext) -> bool {
    !ctx.binding.vents.is_empty()
        && ctx
            .binding
            .vents
            .iter()
            .all(|v| vent_depressurized(v.as_ref()))
}

pub(crate) fn sensor_inside_on(ctx: &AirlockContext) -> bool {
    ctx.binding.inside_sensor.as_ref().is_some_and(|s| s.is_active())
}

pub(crate) fn sensor_inside_off(ctx: &AirlockContext) -> bool {
    !sensor_inside_on(ctx)
}

pub(crate) fn sensor_internal_on(ctx: &AirlockContext) -> bool {
    ctx.binding
        .internal_sensor
        .as_ref()
        .is_some_and(|s| s.is_active())
}

pub(crate) fn sensor_external_on(ctx: &AirlockContext) -> bool {
    ctx.binding
        .external_sensor
        .as_ref()
        .is_some_and(|s| s.is_active())
}

// ---------------------------------------------------------------------------
// Scheduler callbacks
// ---------------------------------------------------------------------------

pub(crate) fn on_inside_sensor(ctx: &mut AirlockContext) -> Option<AirlockProcedure> {
    ctx.dispatch_event(SensorEvent::Inside)
}

pub(crate) fn on_internal_sensor(ctx: &mut AirlockContext) -> Option<AirlockProcedure> {
    ctx.dispatch_event(SensorEvent::Internal)
}

pub(crate) fn on_external_sensor(ctx: &mut AirlockContext) -> Option<AirlockProcedure> {
    ctx.dispatch_event(SensorEvent::External)
}

pub(crate) fn on_state_timeout(ctx: &mut AirlockContext) -> Option<AirlockProcedure> {
    ctx.dispatch_timeout()
}
