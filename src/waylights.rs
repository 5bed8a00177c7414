//! Way-light chase sequencer.
//!
//! Guidance lights along the airlock tunnel are ordered by rectangular
//! distance to the external door, split into contiguous "lines" wherever
//! the distance gap exceeds a threshold, and animated as a rolling chase
//! while a transfer cycle runs.  Purely decorative: every entry point is
//! a no-op with zero lights and nothing here can fail a cycle.

use crate::config::AirlockConfig;
use crate::ports::{BlockId, GridPos, Light};

/// Direction of the rolling chase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseDirection {
    /// Entry: the wave rolls from the external door inward.
    Inward,
    /// Exit: the wave rolls toward the external door.
    Outward,
}

/// One ordered fixture: index into the binding's light list + distance.
#[derive(Debug, Clone, Copy)]
struct OrderedLight {
    index: usize,
    id: BlockId,
    distance: i32,
}

pub struct WayLightSequencer {
    /// Fixtures sorted ascending by distance to the external door.
    order: Vec<OrderedLight>,
    /// Contiguous lines as (start, end) ranges over `order`.
    lines: Vec<(usize, usize)>,
    /// Centroid the current distances were computed against.
    centroid: Option<GridPos>,
    running: Option<ChaseDirection>,
    cursor: u64,
    countdown: u64,
    lit_count: usize,
    period_ticks: u64,
    line_gap: i32,
}

impl WayLightSequencer {
    pub fn new(config: &AirlockConfig) -> Self {
        Self {
            order: Vec::new(),
            lines: Vec::new(),
            centroid: None,
            running: None,
            cursor: 0,
            countdown: 0,
            lit_count: usize::from(config.chase_lit_count),
            period_ticks: config.ticks_from_ms(u64::from(config.chase_interval_ms)),
            line_gap: config.light_line_gap,
        }
    }

    /// Rebuild the ordering for a fresh binding.
    ///
    /// Distances are recomputed only when the external door centroid moved
    /// or a fixture is new; otherwise the cached value is carried over by
    /// block id so the ordering stays put across refreshes.
    pub fn rebind(&mut self, lights: &[Box<dyn Light>], centroid: Option<GridPos>) {
        let moved = centroid != self.centroid;
        let old: Vec<(BlockId, i32)> = self.order.iter().map(|o| (o.id, o.distance)).collect();

        self.order = lights
            .iter()
            .enumerate()
            .map(|(index, light)| {
                let id = light.id();
                let cached = old.iter().find(|(i, _)| *i == id).map(|(_, d)| *d);
                let distance = match (moved, cached, centroid) {
                    (false, Some(d), _) => d,
                    (_, _, Some(c)) => c.rectangular_distance(light.position()),
                    (_, Some(d), None) => d,
                    (_, None, None) => 0,
                };
                OrderedLight { index, id, distance }
            })
            .collect();
        self.order.sort_by_key(|o| o.distance);
        self.centroid = centroid;

        self.lines.clear();
        let mut start = 0;
        for i in 1..self.order.len() {
            if self.order[i].distance - self.order[i - 1].distance > self.line_gap {
                self.lines.push((start, i));
                start = i;
            }
        }
        if start < self.order.len() {
            self.lines.push((start, self.order.len()));
        }
    }

    /// Begin the chase.  Safe with zero lights.
    pub fn start(&mut self, direction: ChaseDirection) {
        self.running = Some(direction);
        self.cursor = 0;
        self.countdown = self.period_ticks;
    }

    /// Turn every fixture off and halt the chase.  Idempotent.
    pub fn stop(&mut self, lights: &mut [Box<dyn Light>]) {
        for entry in &self.order {
            if let Some(light) = lights.get_mut(entry.index) {
                light.set_enabled(false);
            }
        }
        self.running = None;
        self.cursor = 0;
    }

    /// Advance the animation by one scheduler tick.
    pub fn tick(&mut self, lights: &mut [Box<dyn Light>]) {
        let Some(direction) = self.running else {
            return;
        };
        if self.order.is_empty() {
            return;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return;
        }
        self.countdown = self.period_ticks;
        self.cursor += 1;

        for &(start, end) in &self.lines {
            let len = (end - start) as u64;
            let offset = match direction {
                ChaseDirection::Inward => self.cursor % len,
                ChaseDirection::Outward => (len - self.cursor % len) % len,
            };
            for (i, entry) in self.order[start..end].iter().enumerate() {
                let lit = Self::in_window(i as u64, offset, self.lit_count as u64, len);
                if let Some(light) = lights.get_mut(entry.index) {
                    light.set_enabled(lit);
                }
            }
        }
    }

    /// Whether `pos` falls within the lit window `[offset, offset+count)`
    /// modulo `len`.
    fn in_window(pos: u64, offset: u64, count: u64, len: u64) -> bool {
        let rel = (pos + len - offset) % len;
        rel < count.min(len)
    }

    #[cfg(test)]
    fn line_count(&self) -> usize {
        self.lines.len()
    }
}
