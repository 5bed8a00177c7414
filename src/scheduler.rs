//! Cooperative tick-driven scheduler.
//!
//! Single-threaded engine advanced by an external periodic tick.  It owns
//! three kinds of work:
//!
//! * **Timers** — one-shot or repeating callbacks after a tick count.
//! * **Probes** — boolean predicates sampled while enabled, firing a
//!   callback on each false→true edge.
//! * **Tasks** — resumable multi-step [`Procedure`]s that suspend on
//!   predicate waits with a bounded timeout.
//!
//! Within one tick the dispatch order is fixed: timers fire first (slot
//! order), then probes (slot order), then waiting tasks resume (queue
//! order).  The ordering is deterministic so that a state timeout and a
//! sensor event landing on the same tick always resolve the same way.
//!
//! The engine is generic over the context type `C` and the procedure type
//! `P`.  Every callback and predicate is a plain `fn` pointer receiving the
//! context, so the scheduler itself holds no closures and no `dyn`.
//! Callbacks request follow-up work by *returning* a procedure to spawn;
//! they never call back into the scheduler.

use log::error;

use crate::error::{Error, Result};

/// Maximum number of live timers.
pub const MAX_TIMERS: usize = 8;
/// Maximum number of registered probes.
pub const MAX_PROBES: usize = 8;
/// Maximum number of queued tasks.
pub const MAX_TASKS: usize = 4;
/// Maximum procedure call depth within one task.
pub const MAX_CALL_DEPTH: usize = 4;

/// Boolean condition over the shared context.
pub type Predicate<C> = fn(&C) -> bool;

/// Timer/probe callback.  May return a procedure to enqueue; the spawned
/// task starts on the next tick.
pub type SpawnCallback<C, P> = fn(&mut C) -> Option<P>;

// ---------------------------------------------------------------------------
// Procedures
// ---------------------------------------------------------------------------

/// Why a procedure's `step` is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// First call after the procedure was spawned or pushed as a child.
    Begin,
    /// The previous step returned [`Step::Yield`].
    Yielded,
    /// A wait ended.  `satisfied` reports whether the predicate held at
    /// the moment the task resumed; on a timed-out wait it is the value
    /// sampled at the deadline.  The procedure decides the outcome — a
    /// timeout never aborts the task by itself.
    Wait { satisfied: bool },
    /// A child procedure ran to completion.
    Child,
}

/// What a procedure wants to do next.
pub enum Step<C, P> {
    /// The procedure is finished.
    Done,
    /// Resume on the next tick.
    Yield,
    /// Suspend until `predicate` holds (sampled every `poll_ticks`) or
    /// `timeout_ticks` elapse, whichever comes first.  The deadline is
    /// checked before the predicate, so a timeout wins a tie.
    Wait {
        predicate: Predicate<C>,
        poll_ticks: u64,
        timeout_ticks: u64,
    },
    /// Run a child procedure to completion, then resume with
    /// [`Resume::Child`].
    Call(P),
}

/// A resumable multi-step action.
///
/// Implementations are explicit state machines: a step discriminant plus
/// saved locals.  Work between suspension points must be bounded — a step
/// that never yields stalls the tick.
pub trait Procedure<C>: Sized {
    fn step(&mut self, ctx: &mut C, resume: Resume) -> Step<C, Self>;
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to a scheduled timer.  Generation-checked: operations on a
/// cancelled or recycled handle are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    slot: usize,
    generation: u32,
}

/// Handle to a registered probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHandle {
    slot: usize,
    generation: u32,
}

// ---------------------------------------------------------------------------
// Internal slot types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum TimerKind {
    OneShot,
    Interval(u64),
}

struct TimerSlot<C, P> {
    generation: u32,
    kind: TimerKind,
    due: u64,
    callback: SpawnCallback<C, P>,
}

struct ProbeSlot<C, P> {
    generation: u32,
    predicate: Predicate<C>,
    callback: SpawnCallback<C, P>,
    sample_period: u64,
    next_sample: u64,
    last: bool,
    enabled: bool,
}

struct WaitState<C> {
    predicate: Predicate<C>,
    poll_ticks: u64,
    next_sample: u64,
    deadline: u64,
}

struct Task<C, P> {
    stack: heapless::Vec<P, MAX_CALL_DEPTH>,
    wait: Option<WaitState<C>>,
    /// Resume reason for the next step when not waiting.
    resume: Resume,
    /// Tick on which the task was enqueued; it first runs on the tick after.
    spawned_at: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The cooperative scheduling engine.
pub struct Scheduler<C, P: Procedure<C>> {
    now: u64,
    generation: u32,
    timers: [Option<TimerSlot<C, P>>; MAX_TIMERS],
    probes: [Option<ProbeSlot<C, P>>; MAX_PROBES],
    tasks: heapless::Vec<Task<C, P>, MAX_TASKS>,
}

impl<C, P: Procedure<C>> Default for Scheduler<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P: Procedure<C>> Scheduler<C, P> {
    pub fn new() -> Self {
        Self {
            now: 0,
            generation: 0,
            timers: core::array::from_fn(|_| None),
            probes: core::array::from_fn(|_| None),
            tasks: heapless::Vec::new(),
        }
    }

    /// Current logical time in ticks.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// True while any task is queued or suspended.
    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    // ── Timers ────────────────────────────────────────────────

    /// Schedule `callback` to fire once after `delay_ticks` (min 1).
    pub fn set_timeout(
        &mut self,
        delay_ticks: u64,
        callback: SpawnCallback<C, P>,
    ) -> Result<TimerHandle> {
        let due = self.now + delay_ticks.max(1);
        self.insert_timer(TimerKind::OneShot, due, callback)
    }

    /// Schedule `callback` to fire every `period_ticks` (min 1).
    pub fn set_interval(
        &mut self,
        period_ticks: u64,
        callback: SpawnCallback<C, P>,
    ) -> Result<TimerHandle> {
        let period = period_ticks.max(1);
        self.insert_timer(TimerKind::Interval(period), self.now + period, callback)
    }

    /// Cancel a timer.  No-op on a fired, cancelled, or recycled handle.
    pub fn cancel_timer(&mut self, handle: TimerHandle) {
        if let Some(slot) = self.timers.get_mut(handle.slot)
            && slot.as_ref().is_some_and(|t| t.generation == handle.generation)
        {
            *slot = None;
        }
    }

    fn insert_timer(
        &mut self,
        kind: TimerKind,
        due: u64,
        callback: SpawnCallback<C, P>,
    ) -> Result<TimerHandle> {
        for (i, slot) in self.timers.iter_mut().enumerate() {
            if slot.is_none() {
                self.generation += 1;
                *slot = Some(TimerSlot {
                    generation: self.generation,
                    kind,
                    due,
                    callback,
                });
                return Ok(TimerHandle {
                    slot: i,
                    generation: self.generation,
                });
            }
        }
        Err(Error::TimerSlotsFull)
    }

    // ── Probes ────────────────────────────────────────────────

    /// Register an edge-triggered probe, initially enabled.
    ///
    /// While enabled, `predicate` is sampled every `sample_period` ticks
    /// (min 1) and `callback` fires once per false→true edge.
    pub fn add_probe(
        &mut self,
        predicate: Predicate<C>,
        callback: SpawnCallback<C, P>,
        sample_period: u64,
    ) -> Result<ProbeHandle> {
        for (i, slot) in self.probes.iter_mut().enumerate() {
            if slot.is_none() {
                self.generation += 1;
                *slot = Some(ProbeSlot {
                    generation: self.generation,
                    predicate,
                    callback,
                    sample_period: sample_period.max(1),
                    next_sample: self.now + 1,
                    last: false,
                    enabled: true,
                });
                return Ok(ProbeHandle {
                    slot: i,
                    generation: self.generation,
                });
            }
        }
        Err(Error::ProbeSlotsFull)
    }

    /// Enable or disable a probe.  Idempotent; no-op on a stale handle.
    ///
    /// Enabling resets the edge detector: a predicate that is already true
    /// on the first sample after enabling counts as an edge.
    pub fn set_probe_enabled(&mut self, handle: ProbeHandle, enabled: bool) {
        if let Some(slot) = self.probes.get_mut(handle.slot)
            && let Some(probe) = slot
            && probe.generation == handle.generation
            && probe.enabled != enabled
        {
            probe.enabled = enabled;
            if enabled {
                probe.last = false;
                probe.next_sample = self.now + 1;
            }
        }
    }

    /// Whether a probe is currently enabled (false for stale handles).
    pub fn probe_enabled(&self, handle: ProbeHandle) -> bool {
        self.probes
            .get(handle.slot)
            .and_then(Option::as_ref)
            .is_some_and(|p| p.generation == handle.generation && p.enabled)
    }

    // ── Tasks ─────────────────────────────────────────────────

    /// Enqueue a procedure.  Its first step runs on the next tick.
    pub fn add_task(&mut self, procedure: P) -> Result<()> {
        let mut stack = heapless::Vec::new();
        if stack.push(procedure).is_err() {
            return Err(Error::TaskQueueFull);
        }
        self.tasks
            .push(Task {
                stack,
                wait: None,
                resume: Resume::Begin,
                spawned_at: self.now,
            })
            .map_err(|_| Error::TaskQueueFull)
    }

    // ── Tick ──────────────────────────────────────────────────

    /// Advance logical time by one tick and run all due work.
    ///
    /// Must be called at a steady cadence from the host; not re-entrant.
    pub fn tick(&mut self, ctx: &mut C) {
        self.now += 1;
        self.run_timers(ctx);
        self.run_probes(ctx);
        self.run_tasks(ctx);
    }

    fn run_timers(&mut self, ctx: &mut C) {
        for i in 0..MAX_TIMERS {
            let fired = match &mut self.timers[i] {
                Some(timer) if timer.due <= self.now => {
                    let callback = timer.callback;
                    let one_shot = match timer.kind {
                        TimerKind::OneShot => true,
                        TimerKind::Interval(period) => {
                            timer.due = self.now + period;
                            false
                        }
                    };
                    Some((callback, one_shot))
                }
                _ => None,
            };
            if let Some((callback, one_shot)) = fired {
                if one_shot {
                    self.timers[i] = None;
                }
                if let Some(p) = callback(ctx) {
                    self.spawn(p);
                }
            }
        }
    }

    fn run_probes(&mut self, ctx: &mut C) {
        for i in 0..MAX_PROBES {
            let fired = match &mut self.probes[i] {
                Some(probe) if probe.enabled && self.now >= probe.next_sample => {
                    probe.next_sample = self.now + probe.sample_period;
                    let value = (probe.predicate)(ctx);
                    let edge = value && !probe.last;
                    probe.last = value;
                    edge.then_some(probe.callback)
                }
                _ => None,
            };
            if let Some(callback) = fired
                && let Some(p) = callback(ctx)
            {
                self.spawn(p);
            }
        }
    }

    fn run_tasks(&mut self, ctx: &mut C) {
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].spawned_at >= self.now {
                i += 1;
                continue;
            }
            let resume = {
                let task = &mut self.tasks[i];
                match &mut task.wait {
                    Some(wait) => {
                        // Deadline before predicate: timeout wins a tie.
                        if self.now >= wait.deadline {
                            let satisfied = (wait.predicate)(ctx);
                            task.wait = None;
                            Some(Resume::Wait { satisfied })
                        } else if self.now >= wait.next_sample {
                            if (wait.predicate)(ctx) {
                                task.wait = None;
                                Some(Resume::Wait { satisfied: true })
                            } else {
                                wait.next_sample = self.now + wait.poll_ticks;
                                None
                            }
                        } else {
                            None
                        }
                    }
                    None => Some(task.resume),
                }
            };
            let Some(resume) = resume else {
                i += 1;
                continue;
            };
            if self.run_task_steps(i, ctx, resume) {
                let _ = self.tasks.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Step the task at `index` until it finishes or suspends.
    /// Returns true when the task is complete and should be removed.
    fn run_task_steps(&mut self, index: usize, ctx: &mut C, first: Resume) -> bool {
        let task = &mut self.tasks[index];
        let mut resume = first;
        loop {
            let Some(top) = task.stack.last_mut() else {
                return true;
            };
            match top.step(ctx, resume) {
                Step::Done => {
                    let _ = task.stack.pop();
                    if task.stack.is_empty() {
                        return true;
                    }
                    resume = Resume::Child;
                }
                Step::Yield => {
                    task.resume = Resume::Yielded;
                    return false;
                }
                Step::Wait {
                    predicate,
                    poll_ticks,
                    timeout_ticks,
                } => {
                    let poll = poll_ticks.max(1);
                    task.wait = Some(WaitState {
                        predicate,
                        poll_ticks: poll,
                        next_sample: self.now + poll,
                        deadline: self.now + timeout_ticks,
                    });
                    return false;
                }
                Step::Call(child) => {
                    if task.stack.push(child).is_err() {
                        error!("scheduler: procedure call depth exceeded, aborting task");
                        return true;
                    }
                    resume = Resume::Begin;
                }
            }
        }
    }

    fn spawn(&mut self, procedure: P) {
        let mut stack = heapless::Vec::new();
        if stack.push(procedure).is_err() {
            return;
        }
        if self
            .tasks
            .push(Task {
                stack,
                wait: None,
                resume: Resume::Begin,
                spawned_at: self.now,
            })
            .is_err()
        {
            error!("scheduler: task queue full, dropping spawned procedure");
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
