//! Mock hardware for integration tests.
//!
//! Each block is a thin shim over shared `Rc<Cell<_>>` state, so tests
//! hold a [`Rig`] of handles while the controller owns the boxed trait
//! objects.  Doors and vents respond to commands instantly unless marked
//! stuck, which keeps scenario scripts short.

use std::cell::Cell;
use std::rc::Rc;

use cargolock::AirlockConfig;
use cargolock::airlock::AirlockController;
use cargolock::ports::{
    BindingProvider, BlockId, Door, DoorState, GridPos, HardwareBinding, Light, PresenceSensor,
    Vent, VentState,
};

// ── Doors ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DoorHandle {
    state: Rc<Cell<DoorState>>,
    stuck: Rc<Cell<bool>>,
    pos: GridPos,
}

#[allow(dead_code)]
impl DoorHandle {
    fn new(pos: GridPos) -> Self {
        Self {
            state: Rc::new(Cell::new(DoorState::Closed)),
            stuck: Rc::new(Cell::new(false)),
            pos,
        }
    }

    pub fn state(&self) -> DoorState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == DoorState::Open
    }

    pub fn set_state(&self, state: DoorState) {
        self.state.set(state);
    }

    /// A stuck door ignores every command.
    pub fn set_stuck(&self, stuck: bool) {
        self.stuck.set(stuck);
    }
}

struct MockDoor(DoorHandle);

impl Door for MockDoor {
    fn open(&mut self) {
        if !self.0.stuck.get() {
            self.0.state.set(DoorState::Open);
        }
    }

    fn close(&mut self) {
        if !self.0.stuck.get() {
            self.0.state.set(DoorState::Closed);
        }
    }

    fn state(&self) -> DoorState {
        self.0.state.get()
    }

    fn position(&self) -> GridPos {
        self.0.pos
    }
}

// ── Vents ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct VentHandle {
    state: Rc<Cell<Option<VentState>>>,
    oxygen: Rc<Cell<f32>>,
    stuck: Rc<Cell<bool>>,
    analog_only: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl VentHandle {
    fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(Some(VentState::Depressurized))),
            oxygen: Rc::new(Cell::new(0.0)),
            stuck: Rc::new(Cell::new(false)),
            analog_only: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_state(&self, state: Option<VentState>) {
        self.state.set(state);
    }

    pub fn set_oxygen(&self, level: f32) {
        self.oxygen.set(level);
    }

    pub fn set_stuck(&self, stuck: bool) {
        self.stuck.set(stuck);
    }

    /// The vent stops reporting a discrete state; only the oxygen level
    /// remains observable.
    pub fn set_analog_only(&self, analog: bool) {
        self.analog_only.set(analog);
        if analog {
            self.state.set(None);
        }
    }
}

struct MockVent(VentHandle);

impl Vent for MockVent {
    fn set_depressurize(&mut self, depressurize: bool) {
        if self.0.stuck.get() {
            return;
        }
        self.0.oxygen.set(if depressurize { 0.0 } else { 1.0 });
        if !self.0.analog_only.get() {
            let state = if depressurize {
                VentState::Depressurized
            } else {
                VentState::Pressurized
            };
            self.0.state.set(Some(state));
        }
    }

    fn state(&self) -> Option<VentState> {
        self.0.state.get()
    }

    fn oxygen_level(&self) -> f32 {
        self.0.oxygen.get()
    }
}

// ── Sensors and lights ────────────────────────────────────────

#[derive(Clone)]
pub struct SensorHandle {
    active: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl SensorHandle {
    fn new() -> Self {
        Self {
            active: Rc::new(Cell::new(false)),
        }
    }

    pub fn set(&self, active: bool) {
        self.active.set(active);
    }
}

struct MockSensor(SensorHandle);

impl PresenceSensor for MockSensor {
    fn is_active(&self) -> bool {
        self.0.active.get()
    }
}

#[derive(Clone)]
pub struct LightHandle {
    on: Rc<Cell<bool>>,
    id: BlockId,
    pos: GridPos,
}

#[allow(dead_code)]
impl LightHandle {
    fn new(id: BlockId, pos: GridPos) -> Self {
        Self {
            on: Rc::new(Cell::new(false)),
            id,
            pos,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on.get()
    }
}

struct MockLight(LightHandle);

impl Light for MockLight {
    fn set_enabled(&mut self, on: bool) {
        self.0.on.set(on);
    }

    fn id(&self) -> BlockId {
        self.0.id
    }

    fn position(&self) -> GridPos {
        self.0.pos
    }
}

// ── The rig ───────────────────────────────────────────────────

/// Test-side handles for one complete airlock's worth of blocks.
pub struct Rig {
    pub ext_doors: Vec<DoorHandle>,
    pub int_doors: Vec<DoorHandle>,
    pub vents: Vec<VentHandle>,
    pub inside: SensorHandle,
    pub internal: SensorHandle,
    pub external: SensorHandle,
    pub lights: Vec<LightHandle>,
    pub beacon: LightHandle,
}

#[allow(dead_code)]
impl Rig {
    /// One door per side, one vent, all sensors, four way-lights.
    pub fn single() -> Self {
        Self::with_counts(1, 1, 1)
    }

    pub fn with_counts(ext_doors: usize, int_doors: usize, vents: usize) -> Self {
        Self {
            // External doors sit at x=0, internal at x=10; way-lights
            // stretch between them.
            ext_doors: (0..ext_doors)
                .map(|i| DoorHandle::new(GridPos::new(0, i as i32, 0)))
                .collect(),
            int_doors: (0..int_doors)
                .map(|i| DoorHandle::new(GridPos::new(10, i as i32, 0)))
                .collect(),
            vents: (0..vents).map(|_| VentHandle::new()).collect(),
            inside: SensorHandle::new(),
            internal: SensorHandle::new(),
            external: SensorHandle::new(),
            lights: (0..4)
                .map(|i| LightHandle::new(100 + i as BlockId, GridPos::new(2 + 2 * i as i32, 0, 0)))
                .collect(),
            beacon: LightHandle::new(99, GridPos::new(5, 1, 0)),
        }
    }

    pub fn ext_door(&self) -> &DoorHandle {
        &self.ext_doors[0]
    }

    pub fn int_door(&self) -> &DoorHandle {
        &self.int_doors[0]
    }

    pub fn vent(&self) -> &VentHandle {
        &self.vents[0]
    }

    pub fn provider(&self) -> RigProvider {
        RigProvider {
            ext_doors: self.ext_doors.clone(),
            int_doors: self.int_doors.clone(),
            vents: self.vents.clone(),
            inside: self.inside.clone(),
            internal: self.internal.clone(),
            external: self.external.clone(),
            lights: self.lights.clone(),
            beacon: self.beacon.clone(),
        }
    }

    /// Both doors fully open at once is the one unforgivable state.
    pub fn assert_safe(&self) {
        let ext_open = self.ext_doors.iter().any(|d| d.is_open());
        let int_open = self.int_doors.iter().any(|d| d.is_open());
        assert!(
            !(ext_open && int_open),
            "both door sides open simultaneously"
        );
    }
}

/// Rebuilds a fresh binding from the rig's shared cells on every refresh,
/// the same way discovery re-enumerates blocks.
pub struct RigProvider {
    ext_doors: Vec<DoorHandle>,
    int_doors: Vec<DoorHandle>,
    vents: Vec<VentHandle>,
    inside: SensorHandle,
    internal: SensorHandle,
    external: SensorHandle,
    lights: Vec<LightHandle>,
    beacon: LightHandle,
}

impl BindingProvider for RigProvider {
    fn refresh(&mut self) -> HardwareBinding {
        HardwareBinding {
            name: Some("Airlock Cargo".to_string()),
            internal_doors: self
                .int_doors
                .iter()
                .map(|h| Box::new(MockDoor(h.clone())) as Box<dyn Door>)
                .collect(),
            external_doors: self
                .ext_doors
                .iter()
                .map(|h| Box::new(MockDoor(h.clone())) as Box<dyn Door>)
                .collect(),
            vents: self
                .vents
                .iter()
                .map(|h| Box::new(MockVent(h.clone())) as Box<dyn Vent>)
                .collect(),
            internal_sensor: Some(Box::new(MockSensor(self.internal.clone()))),
            external_sensor: Some(Box::new(MockSensor(self.external.clone()))),
            inside_sensor: Some(Box::new(MockSensor(self.inside.clone()))),
            lights: self
                .lights
                .iter()
                .map(|h| Box::new(MockLight(h.clone())) as Box<dyn Light>)
                .collect(),
            beacon: Some(Box::new(MockLight(self.beacon.clone()))),
        }
    }
}

// ── Harness helpers ───────────────────────────────────────────

/// Short timing so scenarios finish in tens of ticks: refresh 10, door
/// timeout 10, action timeout 20.
#[allow(dead_code)]
pub fn fast_config() -> AirlockConfig {
    AirlockConfig {
        tick_interval_ms: 100,
        setup_refresh_secs: 1,
        door_open_timeout_secs: 1,
        action_timeout_secs: 2,
        sensor_poll_ms: 100,
        ..AirlockConfig::default()
    }
}

/// Tick until `pred` holds, checking the safety invariant on every tick.
/// Returns false when `max_ticks` elapse first.
#[allow(dead_code)]
pub fn tick_until(
    ctl: &mut AirlockController<RigProvider>,
    rig: &Rig,
    max_ticks: usize,
    mut pred: impl FnMut(&AirlockController<RigProvider>) -> bool,
) -> bool {
    for _ in 0..max_ticks {
        ctl.tick();
        rig.assert_safe();
        if pred(ctl) {
            return true;
        }
    }
    false
}

/// Tick a fixed number of times, checking the safety invariant throughout.
#[allow(dead_code)]
pub fn tick_n(ctl: &mut AirlockController<RigProvider>, rig: &Rig, n: usize) {
    for _ in 0..n {
        ctl.tick();
        rig.assert_safe();
    }
}
