//! Static transition table.
//!
//! Maps each of the eight stable composite states to its sensor-event
//! reactions and optional state timeout.  Expressed as exhaustive `match`
//! arms so the compiler checks coverage; built once, immutable, no
//! runtime registration.
//!
//! ```text
//!            ┌─ Inside / Internal / External sensor edge
//!  Stable ───┤                reaction() ──▶ Ignore | Run(procedure)
//!  state     └─ persisted past doorOpenTimeout
//!                             state_timeout() ──▶ close the open door
//! ```

use super::status::StableState;

/// A sensor whose rising edge can trigger a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// Presence inside the airlock chamber.
    Inside,
    /// Presence on the pressurized side.
    Internal,
    /// Presence on the vacuum side.
    External,
}

impl SensorEvent {
    pub const ALL: [Self; 3] = [Self::Inside, Self::Internal, Self::External];
}

/// Identifies which procedure a table entry launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    OpenExternal,
    CloseExternal,
    OpenInternal,
    CloseInternal,
    Pressurize,
    Depressurize,
    WayIn,
    WayOut,
}

/// Outcome of a table lookup for a (state, event) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// No handler registered; the event is not even observed here.
    Unhandled,
    /// The event is observed but deliberately suppressed (echo guard).
    Ignore,
    Run(ProcedureKind),
}

/// Reaction of `state` to a rising edge of `event`.
pub fn reaction(state: StableState, event: SensorEvent) -> Reaction {
    use ProcedureKind::{Depressurize, Pressurize, WayIn, WayOut};
    use Reaction::{Ignore, Run, Unhandled};
    use SensorEvent::{External, Inside, Internal};
    use StableState::*;

    match (state, event) {
        // Interior door standing open: traffic heading out.
        (ExtClosedIntOpenPressurized, Inside | External) => Run(WayOut),
        (ExtClosedIntOpenPressurized, Internal) => Ignore,

        // Everything shut and pressurized.
        (ExtClosedIntClosedPressurized, External) => Run(Depressurize),
        (ExtClosedIntClosedPressurized, Internal | Inside) => Run(WayOut),

        // Everything shut and at vacuum.
        (ExtClosedIntClosedDepressurized, Internal) => Run(Pressurize),
        (ExtClosedIntClosedDepressurized, Inside | External) => Run(WayIn),

        // Exterior door standing open to vacuum: traffic heading in.
        (ExtOpenIntClosedDepressurized, Inside | Internal) => Run(WayIn),
        (ExtOpenIntClosedDepressurized, External) => Ignore,

        _ => Unhandled,
    }
}

/// Procedure to run when `state` persists past the door-open timeout.
pub fn state_timeout(state: StableState) -> Option<ProcedureKind> {
    use ProcedureKind::{CloseExternal, CloseInternal};
    use StableState::*;

    match state {
        ExtOpenIntOpenPressurized => Some(CloseExternal),
        ExtClosedIntOpenPressurized => Some(CloseInternal),
        ExtOpenIntClosedPressurized => Some(CloseExternal),
        ExtOpenIntOpenDepressurized => Some(CloseInternal),
        ExtClosedIntOpenDepressurized => Some(CloseInternal),
        ExtOpenIntClosedDepressurized => Some(CloseExternal),
        ExtClosedIntClosedPressurized | ExtClosedIntClosedDepressurized => None,
    }
}
