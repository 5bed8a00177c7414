//! Port traits — the boundary between the controller and physical blocks.
//!
//! ```text
//!   discovery collaborator ──▶ BindingProvider ──▶ AirlockController
//! ```
//!
//! The discovery/classification collaborator owns block lookup by name and
//! group; the controller only ever sees the capability traits below.  A
//! binding is rebuilt wholesale on every refresh and any subset of blocks
//! may be absent — the controller treats missing hardware as a permanently
//! unknown axis, never as an error.

/// Stable identifier for a physical block, preserved across rebinds.
pub type BlockId = u64;

/// Integer grid position of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Rectangular (Manhattan) distance between two positions.
    pub fn rectangular_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Observed state of a single door block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Opening,
    Closed,
    Closing,
}

/// Observed state of a single air vent block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VentState {
    Pressurized,
    Pressurizing,
    Depressurized,
    Depressurizing,
}

/// A powered door.
pub trait Door {
    fn open(&mut self);
    fn close(&mut self);
    fn state(&self) -> DoorState;
    fn position(&self) -> GridPos;
}

/// An air vent.  Vents without discrete status reporting return `None`
/// from [`state`](Vent::state); the controller then falls back to the
/// oxygen level (<0.01 counts as depressurized, >0.99 as pressurized).
pub trait Vent {
    /// Command the vent: `true` pumps the room down, `false` refills it.
    fn set_depressurize(&mut self, depressurize: bool);
    fn state(&self) -> Option<VentState>;
    /// Room oxygen fraction in `[0, 1]`.
    fn oxygen_level(&self) -> f32;
}

/// A presence sensor.
pub trait PresenceSensor {
    fn is_active(&self) -> bool;
}

/// A lighting fixture (way-light or warning beacon).
pub trait Light {
    fn set_enabled(&mut self, on: bool);
    fn id(&self) -> BlockId;
    fn position(&self) -> GridPos;
}

// ---------------------------------------------------------------------------
// Hardware binding
// ---------------------------------------------------------------------------

/// The classified block handles for one airlock instance.
///
/// Replaced wholesale on each refresh; stale handles from a previous
/// binding are simply dropped.
pub struct HardwareBinding {
    /// Display name of the managed block group, if one was found.
    pub name: Option<String>,
    pub internal_doors: Vec<Box<dyn Door>>,
    pub external_doors: Vec<Box<dyn Door>>,
    pub vents: Vec<Box<dyn Vent>>,
    /// Presence sensor on the pressurized (interior) side.
    pub internal_sensor: Option<Box<dyn PresenceSensor>>,
    /// Presence sensor on the vacuum (exterior) side.
    pub external_sensor: Option<Box<dyn PresenceSensor>>,
    /// Presence sensor inside the airlock chamber itself.
    pub inside_sensor: Option<Box<dyn PresenceSensor>>,
    /// Guidance lights, in discovery order (the controller re-orders them).
    pub lights: Vec<Box<dyn Light>>,
    /// Warning beacon enabled while the atmosphere is changing.
    pub beacon: Option<Box<dyn Light>>,
}

impl HardwareBinding {
    /// A binding with no blocks at all ("no group found").
    pub fn empty() -> Self {
        Self {
            name: None,
            internal_doors: Vec::new(),
            external_doors: Vec::new(),
            vents: Vec::new(),
            internal_sensor: None,
            external_sensor: None,
            inside_sensor: None,
            lights: Vec::new(),
            beacon: None,
        }
    }

    /// Average position of the external doors, used to order way-lights.
    pub fn external_door_centroid(&self) -> Option<GridPos> {
        if self.external_doors.is_empty() {
            return None;
        }
        let mut sum = GridPos::default();
        for door in &self.external_doors {
            let p = door.position();
            sum.x += p.x;
            sum.y += p.y;
            sum.z += p.z;
        }
        let n = self.external_doors.len() as i32;
        Some(GridPos::new(sum.x / n, sum.y / n, sum.z / n))
    }
}

/// Supplies a fresh [`HardwareBinding`] on each configuration refresh.
pub trait BindingProvider {
    fn refresh(&mut self) -> HardwareBinding;
}
