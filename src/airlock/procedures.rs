//! Resumable actuation procedures.
//!
//! Each multi-step action is an explicit state machine: a step
//! discriminant plus saved locals, resumed by the scheduler when its wait
//! condition resolves.  Procedures own no state beyond the shared
//! [`AirlockContext`]; the controller guarantees only one top-level
//! procedure runs at a time.
//!
//! ```text
//!  WayIn:  flag ──▶ open ext ──▶ lights ──▶ arrival loop ──▶ close ext
//!            ──▶ pressurize ──▶ open int ──▶ departure ──▶ unflag
//!  WayOut: mirror image (internal/external and air polarity swapped)
//! ```
//!
//! A failed child (door or vent timeout) sets the sticky Error flag; the
//! cycle then aborts with its cycling flag left set so the operator can
//! see which choreography was interrupted.

use log::info;

use crate::scheduler::{Procedure, Resume, Step};
use crate::waylights::ChaseDirection;

use super::context::{
    self, AirlockContext, DoorSide, external_doors_closed, external_doors_open,
    internal_doors_closed, internal_doors_open, sensor_inside_off, sensor_inside_on,
    vents_depressurized, vents_pressurized,
};
use super::status::{AirPhase, DoorPhase};
use super::table::ProcedureKind;

/// Top-level procedure value stored by the scheduler.
pub enum AirlockProcedure {
    Door(DoorProc),
    Air(AirProc),
    Cycle(CycleProc),
}

impl AirlockProcedure {
    pub(crate) fn from_kind(kind: ProcedureKind) -> Self {
        match kind {
            ProcedureKind::OpenExternal => Self::Door(DoorProc::new(DoorSide::External, true)),
            ProcedureKind::CloseExternal => Self::Door(DoorProc::new(DoorSide::External, false)),
            ProcedureKind::OpenInternal => Self::Door(DoorProc::new(DoorSide::Internal, true)),
            ProcedureKind::CloseInternal => Self::Door(DoorProc::new(DoorSide::Internal, false)),
            ProcedureKind::Pressurize => Self::Air(AirProc::new(true)),
            ProcedureKind::Depressurize => Self::Air(AirProc::new(false)),
            ProcedureKind::WayIn => Self::Cycle(CycleProc::new(CycleDir::In)),
            ProcedureKind::WayOut => Self::Cycle(CycleProc::new(CycleDir::Out)),
        }
    }
}

impl Procedure<AirlockContext> for AirlockProcedure {
    fn step(&mut self, ctx: &mut AirlockContext, resume: Resume) -> Step<AirlockContext, Self> {
        match self {
            Self::Door(p) => p.step(ctx, resume),
            Self::Air(p) => p.step(ctx, resume),
            Self::Cycle(p) => p.step(ctx, resume),
        }
    }
}

// ---------------------------------------------------------------------------
// Door motion
// ---------------------------------------------------------------------------

/// Drive all doors of one side to a target state.
pub struct DoorProc {
    side: DoorSide,
    open: bool,
    commanded: bool,
}

impl DoorProc {
    fn new(side: DoorSide, open: bool) -> Self {
        Self {
            side,
            open,
            commanded: false,
        }
    }

    fn target_reached(&self) -> fn(&AirlockContext) -> bool {
        match (self.side, self.open) {
            (DoorSide::External, true) => external_doors_open,
            (DoorSide::External, false) => external_doors_closed,
            (DoorSide::Internal, true) => internal_doors_open,
            (DoorSide::Internal, false) => internal_doors_closed,
        }
    }

    fn step(
        &mut self,
        ctx: &mut AirlockContext,
        _resume: Resume,
    ) -> Step<AirlockContext, AirlockProcedure> {
        if !self.commanded {
            self.commanded = true;
            let phase = if self.open {
                DoorPhase::Opening
            } else {
                DoorPhase::Closing
            };
            ctx.set_door_phase(self.side, phase);
            ctx.command_doors(self.side, self.open);
            return Step::Wait {
                predicate: self.target_reached(),
                poll_ticks: ctx.timing.sensor_poll,
                timeout_ticks: ctx.timing.action_timeout,
            };
        }
        // Back from the wait: re-check the hardware, not the wait result.
        if (self.target_reached())(ctx) {
            let phase = if self.open {
                DoorPhase::Open
            } else {
                DoorPhase::Closed
            };
            ctx.set_door_phase(self.side, phase);
        } else {
            ctx.set_error();
        }
        Step::Done
    }
}

// ---------------------------------------------------------------------------
// Atmosphere change
// ---------------------------------------------------------------------------

/// Drive all vents to a pressure target, with the warning beacon lit for
/// the duration.  On timeout the beacon is left on deliberately — the
/// chamber pressure is not trustworthy.
pub struct AirProc {
    pressurize: bool,
    commanded: bool,
}

impl AirProc {
    fn new(pressurize: bool) -> Self {
        Self {
            pressurize,
            commanded: false,
        }
    }

    fn target_reached(&self) -> fn(&AirlockContext) -> bool {
        if self.pressurize {
            vents_pressurized
        } else {
            vents_depressurized
        }
    }

    fn step(
        &mut self,
        ctx: &mut AirlockContext,
        _resume: Resume,
    ) -> Step<AirlockContext, AirlockProcedure> {
        if !self.commanded {
            self.commanded = true;
            ctx.command_vents(!self.pressurize);
            ctx.set_beacon(true);
            let phase = if self.pressurize {
                AirPhase::Pressurizing
            } else {
                AirPhase::Depressurizing
            };
            ctx.set_air_phase(phase);
            return Step::Wait {
                predicate: self.target_reached(),
                poll_ticks: ctx.timing.sensor_poll,
                timeout_ticks: ctx.timing.action_timeout,
            };
        }
        if (self.target_reached())(ctx) {
            let phase = if self.pressurize {
                AirPhase::Pressurized
            } else {
                AirPhase::Depressurized
            };
            ctx.set_air_phase(phase);
            ctx.set_beacon(false);
        } else {
            ctx.set_error();
        }
        Step::Done
    }
}

// ---------------------------------------------------------------------------
// Entry / exit choreography
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDir {
    /// Way-In: vacuum side → pressurized side.
    In,
    /// Way-Out: pressurized side → vacuum side.
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStep {
    Start,
    OuterOpened,
    Arrival,
    OuterClosed,
    AirSettled,
    InnerOpened,
    Departed,
}

/// The full transfer cycle, parameterised by direction.  "Outer" is the
/// door the traveller arrives through (external for Way-In, internal for
/// Way-Out); "inner" is the door they leave through.
pub struct CycleProc {
    dir: CycleDir,
    step: CycleStep,
}

impl CycleProc {
    fn new(dir: CycleDir) -> Self {
        Self {
            dir,
            step: CycleStep::Start,
        }
    }

    fn outer(&self) -> DoorSide {
        match self.dir {
            CycleDir::In => DoorSide::External,
            CycleDir::Out => DoorSide::Internal,
        }
    }

    fn inner(&self) -> DoorSide {
        match self.dir {
            CycleDir::In => DoorSide::Internal,
            CycleDir::Out => DoorSide::External,
        }
    }

    /// The cycle only starts from the air state matching the outer door's
    /// side: vacuum for Way-In, pressure for Way-Out.
    fn start_air_ok(&self, ctx: &AirlockContext) -> bool {
        match self.dir {
            CycleDir::In => vents_depressurized(ctx),
            CycleDir::Out => vents_pressurized(ctx),
        }
    }

    /// Presence on the outer side restarts the arrival wait: the inside
    /// sensor edge may be an echo of someone still in the doorway.
    fn echo_sensor_on(&self, ctx: &AirlockContext) -> bool {
        match self.dir {
            CycleDir::In => context::sensor_external_on(ctx),
            CycleDir::Out => context::sensor_internal_on(ctx),
        }
    }

    fn chase_direction(&self) -> ChaseDirection {
        match self.dir {
            CycleDir::In => ChaseDirection::Inward,
            CycleDir::Out => ChaseDirection::Outward,
        }
    }

    fn set_cycling(&self, ctx: &mut AirlockContext, on: bool) {
        match self.dir {
            CycleDir::In => ctx.status.entry_cycling = on,
            CycleDir::Out => ctx.status.exit_cycling = on,
        }
    }

    fn open_door(side: DoorSide) -> AirlockProcedure {
        AirlockProcedure::Door(DoorProc::new(side, true))
    }

    fn close_door(side: DoorSide) -> AirlockProcedure {
        AirlockProcedure::Door(DoorProc::new(side, false))
    }

    fn wait_inside(
        &self,
        ctx: &AirlockContext,
        on: bool,
    ) -> Step<AirlockContext, AirlockProcedure> {
        Step::Wait {
            predicate: if on { sensor_inside_on } else { sensor_inside_off },
            poll_ticks: ctx.timing.sensor_poll,
            timeout_ticks: ctx.timing.action_timeout,
        }
    }

    /// Normal completion or graceful termination: lights out, flag cleared.
    fn finish(&self, ctx: &mut AirlockContext) -> Step<AirlockContext, AirlockProcedure> {
        ctx.lights_stop();
        self.set_cycling(ctx, false);
        info!("{:?} cycle finished", self.dir);
        Step::Done
    }

    /// A child procedure failed: lights out, but the cycling flag stays
    /// set so the interrupted choreography is visible in the status.
    fn abort(&self, ctx: &mut AirlockContext) -> Step<AirlockContext, AirlockProcedure> {
        ctx.lights_stop();
        info!("{:?} cycle aborted on error", self.dir);
        Step::Done
    }

    fn step(
        &mut self,
        ctx: &mut AirlockContext,
        _resume: Resume,
    ) -> Step<AirlockContext, AirlockProcedure> {
        match self.step {
            CycleStep::Start => {
                self.set_cycling(ctx, true);
                info!("{:?} cycle started", self.dir);
                if !self.start_air_ok(ctx) {
                    return self.finish(ctx);
                }
                ctx.lights_stop();
                self.step = CycleStep::OuterOpened;
                Step::Call(Self::open_door(self.outer()))
            }
            CycleStep::OuterOpened => {
                if ctx.status.error {
                    return self.abort(ctx);
                }
                ctx.lights_start(self.chase_direction());
                self.step = CycleStep::Arrival;
                self.wait_inside(ctx, true)
            }
            CycleStep::Arrival => {
                if self.echo_sensor_on(ctx) {
                    // Someone is still in the outer doorway; wait again.
                    return self.wait_inside(ctx, true);
                }
                if !sensor_inside_on(ctx) {
                    // Nobody came through before the wait elapsed.
                    return self.finish(ctx);
                }
                self.step = CycleStep::OuterClosed;
                Step::Call(Self::close_door(self.outer()))
            }
            CycleStep::OuterClosed => {
                if ctx.status.error {
                    return self.abort(ctx);
                }
                self.step = CycleStep::AirSettled;
                Step::Call(AirlockProcedure::Air(AirProc::new(self.dir == CycleDir::In)))
            }
            CycleStep::AirSettled => {
                if ctx.status.error {
                    return self.abort(ctx);
                }
                self.step = CycleStep::InnerOpened;
                Step::Call(Self::open_door(self.inner()))
            }
            CycleStep::InnerOpened => {
                if ctx.status.error {
                    return self.abort(ctx);
                }
                self.step = CycleStep::Departed;
                self.wait_inside(ctx, false)
            }
            // The departure wait result is irrelevant: the cycle is over
            // either way.
            CycleStep::Departed => self.finish(ctx),
        }
    }
}
