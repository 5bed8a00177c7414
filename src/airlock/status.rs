//! Composite airlock status.
//!
//! Three independent axes (external door, internal door, atmosphere) plus
//! three additive flags.  Each axis holds exactly one phase at a time; the
//! flags are set and cleared explicitly and never implied by the axes.
//! The Error flag is sticky: re-derivation from hardware never clears it,
//! only an explicit reset does.

use serde::Serialize;

/// Phase of one door axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorPhase {
    #[default]
    Unknown,
    Closed,
    Closing,
    Open,
    Opening,
}

impl DoorPhase {
    /// True for `Open` and `Closed` — the values that participate in
    /// stable-state dispatch.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }

    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

/// Phase of the atmosphere axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AirPhase {
    #[default]
    Unknown,
    Pressurized,
    Pressurizing,
    Depressurized,
    Depressurizing,
}

impl AirPhase {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Pressurized | Self::Depressurized)
    }

    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Pressurizing | Self::Depressurizing)
    }
}

/// The airlock as a whole: three axes plus cycle/error flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AirlockStatus {
    pub external_door: DoorPhase,
    pub internal_door: DoorPhase,
    pub air: AirPhase,
    /// A Way-In cycle is running.
    pub entry_cycling: bool,
    /// A Way-Out cycle is running.
    pub exit_cycling: bool,
    /// Sticky fault flag; suppresses automatic dispatch until reset.
    pub error: bool,
}

impl AirlockStatus {
    /// Collapse the axes to a stable composite state, or `None` while any
    /// axis is unknown or in motion.
    pub fn stable_state(&self) -> Option<StableState> {
        let ext = match self.external_door {
            DoorPhase::Open => true,
            DoorPhase::Closed => false,
            _ => return None,
        };
        let int = match self.internal_door {
            DoorPhase::Open => true,
            DoorPhase::Closed => false,
            _ => return None,
        };
        let pressurized = match self.air {
            AirPhase::Pressurized => true,
            AirPhase::Depressurized => false,
            _ => return None,
        };
        Some(StableState::from_axes(ext, int, pressurized))
    }
}

/// The eight settled composite states used for event dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StableState {
    ExtOpenIntOpenPressurized,
    ExtClosedIntOpenPressurized,
    ExtOpenIntClosedPressurized,
    ExtClosedIntClosedPressurized,
    ExtOpenIntOpenDepressurized,
    ExtClosedIntOpenDepressurized,
    ExtOpenIntClosedDepressurized,
    ExtClosedIntClosedDepressurized,
}

impl StableState {
    pub const COUNT: usize = 8;

    /// All stable states, in dispatch-table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ExtOpenIntOpenPressurized,
        Self::ExtClosedIntOpenPressurized,
        Self::ExtOpenIntClosedPressurized,
        Self::ExtClosedIntClosedPressurized,
        Self::ExtOpenIntOpenDepressurized,
        Self::ExtClosedIntOpenDepressurized,
        Self::ExtOpenIntClosedDepressurized,
        Self::ExtClosedIntClosedDepressurized,
    ];

    fn from_axes(ext_open: bool, int_open: bool, pressurized: bool) -> Self {
        match (ext_open, int_open, pressurized) {
            (true, true, true) => Self::ExtOpenIntOpenPressurized,
            (false, true, true) => Self::ExtClosedIntOpenPressurized,
            (true, false, true) => Self::ExtOpenIntClosedPressurized,
            (false, false, true) => Self::ExtClosedIntClosedPressurized,
            (true, true, false) => Self::ExtOpenIntOpenDepressurized,
            (false, true, false) => Self::ExtClosedIntOpenDepressurized,
            (true, false, false) => Self::ExtOpenIntClosedDepressurized,
            (false, false, false) => Self::ExtClosedIntClosedDepressurized,
        }
    }
}
