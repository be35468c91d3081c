//! The simulation executive.
//!
//! A [`Simulator`] owns the simulation clock, one pending-event list, and
//! every event created against it. Client code holds [`EventId`] handles and
//! drives events through methods on the simulator; actions receive
//! `&mut Simulator` when they fire, so scheduling from inside an action goes
//! through the same checked entry points as scheduling from outside.

use crate::config::{SimulatorConfig, DEFAULT_PRIORITY, NEXT_PRIORITY};
use crate::continuous::{ContinuousState, VariableId};
use crate::event::{Action, EventSlot, EventState};
use crate::SimError;
use serde::{Deserialize, Serialize};
use simevents_eventlist::{EventId, EventKey, EventList, EventListKind};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn};

/// Source of per-simulator tags stamped into every [`EventId`].
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Label of the event that drives continuous integration.
pub const INTEGRATION_STEP: &str = "integration step";

/// Run state of the executive.
///
/// ```text
/// Idle ──start()──▶ Running ──stop()──▶ StopRequested
///  ▲                   │                     │
///  └── list exhausted ─┘                     │
///  └──────── after current action ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Not dispatching events.
    Idle,
    /// Inside `start()` or `run_until()`.
    Running,
    /// `stop()` was called; the loop exits once the current action returns.
    StopRequested,
}

/// Statistics collected across the simulator's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Insertions into the pending set (reschedules included).
    pub events_scheduled: u64,
    /// Events dispatched.
    pub events_processed: u64,
    /// Pending events removed by `cancel`.
    pub events_cancelled: u64,
    /// Calls to `start()` / `run_until()` that entered the loop.
    pub runs: u64,
    /// Stop requests honoured.
    pub stops: u64,
}

/// Discrete-event simulation executive.
///
/// Events fire in (time, priority, insertion) order. The clock only moves
/// when an event is dispatched, and always to exactly that event's time.
///
/// # Example
///
/// ```
/// use simevents_core::Simulator;
///
/// let mut sim = Simulator::new();
/// let tick = sim.create_event(|sim, me| {
///     if sim.time() < 3.0 {
///         sim.schedule(me, 1.0).unwrap();
///     }
/// });
/// sim.schedule(tick, 0.0).unwrap();
/// sim.start().unwrap();
/// assert_eq!(sim.time(), 3.0);
/// assert_eq!(sim.stats().events_processed, 4);
/// ```
#[derive(Debug)]
pub struct Simulator {
    /// Current simulation time.
    now: f64,

    /// Pending events, ordered by (time, priority, sequence).
    event_list: Box<dyn EventList>,

    /// Every live event, pending or not.
    events: HashMap<EventId, EventSlot>,

    /// Tag carried by the ids of this simulator's events.
    owner: u64,

    /// Last id handed out.
    next_id: u64,

    /// Sequence counter for deterministic FIFO ordering.
    sequence: u64,

    state: RunState,

    stats: SimulationStats,

    /// Continuous variables integrated by a recurring step event.
    continuous: ContinuousState,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Create a simulator with the default event-list strategy.
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Create a simulator from a configuration.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self::with_event_list(config.event_list.build())
    }

    /// Create a simulator around a caller-supplied event list.
    ///
    /// The list is cleared before use.
    pub fn with_event_list(mut event_list: Box<dyn EventList>) -> Self {
        event_list.clear();
        let owner = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
        debug!(strategy = event_list.name(), owner, "Created simulator");
        Self {
            now: 0.0,
            event_list,
            events: HashMap::new(),
            owner,
            next_id: 0,
            sequence: 0,
            state: RunState::Idle,
            stats: SimulationStats::default(),
            continuous: ContinuousState::new(owner),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Clock and run control
    // ═══════════════════════════════════════════════════════════════════════

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.now
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Check if a run is in progress (including one that is stopping).
    pub fn is_simulating(&self) -> bool {
        self.state != RunState::Idle
    }

    /// Check if the executive is not actively dispatching.
    pub fn is_stopped(&self) -> bool {
        self.state != RunState::Running
    }

    /// Get simulation statistics.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Read access to the pending-event list.
    pub fn event_list(&self) -> &dyn EventList {
        self.event_list.as_ref()
    }

    /// Number of pending events.
    pub fn pending_len(&self) -> usize {
        self.event_list.len()
    }

    /// Reset the clock to zero and empty the pending set.
    ///
    /// Pending events are not fired; they become `Unscheduled` and can be
    /// scheduled again. Pending one-shot events are discarded.
    pub fn init(&mut self) -> Result<(), SimError> {
        if self.state != RunState::Idle {
            return Err(SimError::InitWhileRunning);
        }

        let discarded = self.event_list.len();
        self.event_list.clear();
        self.events.retain(|_, slot| {
            let was_pending = slot.detach().is_some();
            !(was_pending && slot.one_shot)
        });
        self.now = 0.0;
        self.continuous.deactivate_all();

        debug!(discarded, "Simulator initialized");
        Ok(())
    }

    /// Replace the event-list strategy, then [`init`](Self::init).
    pub fn init_with(&mut self, kind: EventListKind) -> Result<(), SimError> {
        if self.state != RunState::Idle {
            return Err(SimError::InitWhileRunning);
        }
        debug!(from = self.event_list.name(), to = %kind, "Switching event list");
        self.event_list = kind.build();
        self.init()
    }

    /// Dispatch events until the pending set is empty or `stop()` is called.
    ///
    /// # Errors
    ///
    /// - [`SimError::AlreadyRunning`] if called from inside an action
    /// - [`SimError::EmptyEventList`] if nothing is pending
    pub fn start(&mut self) -> Result<(), SimError> {
        self.check_startable()?;
        self.run(None);
        Ok(())
    }

    /// Like [`start`](Self::start), but leaves events later than `end_time`
    /// pending.
    ///
    /// The clock is not advanced to `end_time`; it stays at the time of the
    /// last dispatched event.
    pub fn run_until(&mut self, end_time: f64) -> Result<(), SimError> {
        if end_time.is_nan() {
            return Err(SimError::NotFinite(end_time));
        }
        self.check_startable()?;
        self.run(Some(end_time));
        Ok(())
    }

    /// Request the current run to end after the executing action returns.
    ///
    /// Harmless when no run is in progress.
    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::StopRequested;
            self.stats.stops += 1;
            debug!(time = self.now, "Stop requested");
        }
    }

    fn check_startable(&self) -> Result<(), SimError> {
        if self.state != RunState::Idle {
            return Err(SimError::AlreadyRunning);
        }
        if self.event_list.is_empty() {
            return Err(SimError::EmptyEventList);
        }
        Ok(())
    }

    fn run(&mut self, end_time: Option<f64>) {
        self.state = RunState::Running;
        self.stats.runs += 1;
        let processed_before = self.stats.events_processed;

        info!(
            pending = self.event_list.len(),
            time = self.now,
            strategy = self.event_list.name(),
            "Simulation started"
        );

        while self.state == RunState::Running {
            if let Some(end_time) = end_time {
                match self.event_list.first() {
                    Some(key) if key.time > end_time => {
                        debug!(
                            end_time,
                            remaining_events = self.event_list.len(),
                            "Time limit reached"
                        );
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }

            let Some(key) = self.event_list.remove_first() else {
                break;
            };
            self.dispatch(key);
        }

        let stopped = self.state == RunState::StopRequested;
        self.state = RunState::Idle;

        info!(
            events_processed = self.stats.events_processed - processed_before,
            time = self.now,
            remaining_events = self.event_list.len(),
            stopped,
            "Simulation finished"
        );
    }

    /// Advance the clock to `key` and run its event's action.
    fn dispatch(&mut self, key: EventKey) {
        debug_assert!(key.time >= self.now, "clock must not move backwards");
        self.now = key.time;
        self.stats.events_processed += 1;

        let Some(slot) = self.events.get_mut(&key.id) else {
            warn!(event = %key.id, "Dispatched event has no record");
            return;
        };
        slot.key = None;
        slot.state = EventState::Executing;
        let Some(mut action) = slot.action.take() else {
            warn!(event = %key.id, "Dispatched event has no action");
            return;
        };

        trace!(
            time = key.time,
            priority = key.priority,
            event = %key.id,
            "Processing event"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| action.fire(self, key.id)));

        // The action may have removed its own event.
        let mut finished_one_shot = false;
        if let Some(slot) = self.events.get_mut(&key.id) {
            slot.action = Some(action);
            if slot.state == EventState::Executing {
                slot.state = EventState::Unscheduled;
                finished_one_shot = slot.one_shot;
            }
        }
        if finished_one_shot {
            self.events.remove(&key.id);
        }

        if let Err(payload) = outcome {
            self.state = RunState::Idle;
            panic::resume_unwind(payload);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event construction
    // ═══════════════════════════════════════════════════════════════════════

    /// Create an unscheduled event with the default priority.
    pub fn create_event<F>(&mut self, action: F) -> EventId
    where
        F: FnMut(&mut Simulator, EventId) + Send + 'static,
    {
        self.insert_event(Box::new(action), None, false)
    }

    /// Create an unscheduled event carrying a label for lookups.
    pub fn create_labelled_event<F>(&mut self, label: &'static str, action: F) -> EventId
    where
        F: FnMut(&mut Simulator, EventId) + Send + 'static,
    {
        self.insert_event(Box::new(action), Some(label), false)
    }

    /// Create an unscheduled event from an [`Action`] implementation.
    pub fn create_event_from<A>(&mut self, action: A) -> EventId
    where
        A: Action + 'static,
    {
        self.insert_event(Box::new(action), None, false)
    }

    /// Create and schedule an event that is discarded after it fires or is
    /// cancelled.
    pub fn schedule_once<F>(&mut self, delay: f64, action: F) -> Result<EventId, SimError>
    where
        F: FnMut(&mut Simulator, EventId) + Send + 'static,
    {
        let time = self.time_after(delay)?;
        let id = self.insert_event(Box::new(action), None, true);
        self.insert_pending(id, time, None)?;
        Ok(id)
    }

    /// Drop an event, cancelling it first if it is pending.
    ///
    /// Returns `false` if the id is unknown.
    pub fn remove_event(&mut self, id: EventId) -> bool {
        match self.events.remove(&id) {
            Some(mut slot) => {
                if let Some(key) = slot.detach() {
                    self.event_list.remove(&key);
                }
                true
            }
            None => false,
        }
    }

    fn insert_event(
        &mut self,
        action: Box<dyn Action>,
        label: Option<&'static str>,
        one_shot: bool,
    ) -> EventId {
        self.next_id += 1;
        let id = EventId::new(self.owner, self.next_id);
        self.events
            .insert(id, EventSlot::new(action, DEFAULT_PRIORITY, label, one_shot));
        id
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Check if `id` was created by this simulator.
    ///
    /// Ids of other simulators are never live here: every operation treats
    /// them as unknown.
    pub fn owns(&self, id: EventId) -> bool {
        id.owner() == self.owner
    }

    /// Lifecycle state of an event, `None` if unknown.
    pub fn event_state(&self, id: EventId) -> Option<EventState> {
        self.events.get(&id).map(|slot| slot.state)
    }

    /// Scheduled time of a pending event.
    pub fn event_time(&self, id: EventId) -> Option<f64> {
        self.events.get(&id)?.key.map(|key| key.time)
    }

    /// Priority of an event.
    pub fn priority(&self, id: EventId) -> Option<f64> {
        self.events.get(&id).map(|slot| slot.priority)
    }

    /// Label of an event, if it was created with one.
    pub fn label(&self, id: EventId) -> Option<&'static str> {
        self.events.get(&id)?.label
    }

    /// Change the priority used the next time the event is scheduled.
    pub fn set_priority(&mut self, id: EventId, priority: f64) -> Result<(), SimError> {
        if !priority.is_finite() {
            return Err(SimError::NotFinite(priority));
        }
        let slot = self.events.get_mut(&id).ok_or(SimError::UnknownEvent(id))?;
        if slot.state == EventState::Pending {
            return Err(SimError::AlreadyScheduled(id));
        }
        slot.priority = priority;
        Ok(())
    }

    /// Pending events in firing order.
    pub fn pending_events(&self) -> Vec<EventId> {
        self.event_list
            .ordered_keys()
            .into_iter()
            .map(|key| key.id)
            .collect()
    }

    /// The first pending event carrying `label`, in firing order.
    pub fn first_labelled(&self, label: &str) -> Option<EventId> {
        self.event_list
            .ordered_keys()
            .into_iter()
            .map(|key| key.id)
            .find(|id| self.label(*id) == Some(label))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════════

    /// Schedule an event `delay` time units from now.
    ///
    /// # Errors
    ///
    /// - [`SimError::InvalidDelay`] if `delay` is negative or not finite
    /// - [`SimError::NotFinite`] if `now + delay` overflows
    /// - [`SimError::AlreadyScheduled`] if the event is pending
    /// - [`SimError::UnknownEvent`] if the id is not live
    pub fn schedule(&mut self, id: EventId, delay: f64) -> Result<(), SimError> {
        let time = self.time_after(delay)?;
        self.insert_pending(id, time, None)
    }

    /// Set the event's priority, then schedule it `delay` from now.
    pub fn schedule_with_priority(
        &mut self,
        id: EventId,
        delay: f64,
        priority: f64,
    ) -> Result<(), SimError> {
        if !priority.is_finite() {
            return Err(SimError::NotFinite(priority));
        }
        let time = self.time_after(delay)?;
        self.insert_pending(id, time, Some(priority))
    }

    /// Schedule an event at an absolute simulation time.
    pub fn schedule_at(&mut self, id: EventId, time: f64) -> Result<(), SimError> {
        if !time.is_finite() {
            return Err(SimError::NotFinite(time));
        }
        if time < self.now {
            return Err(SimError::ScheduleInPast { time, now: self.now });
        }
        self.insert_pending(id, time, None)
    }

    /// Schedule an event at the current time with priority 0.
    ///
    /// It fires before any pending default-priority event of the current
    /// instant; events scheduled this way keep FIFO order among themselves.
    pub fn schedule_next(&mut self, id: EventId) -> Result<(), SimError> {
        self.insert_pending(id, self.now, Some(NEXT_PRIORITY))
    }

    /// Move a pending event to `delay` from now.
    ///
    /// The event goes behind every event already scheduled for the same
    /// time and priority.
    pub fn reschedule(&mut self, id: EventId, delay: f64) -> Result<(), SimError> {
        let time = self.time_after(delay)?;
        let slot = self.events.get_mut(&id).ok_or(SimError::UnknownEvent(id))?;
        if slot.state != EventState::Pending {
            return Err(SimError::NotScheduled(id));
        }
        if let Some(key) = slot.detach() {
            self.event_list.remove(&key);
        }
        self.insert_pending(id, time, None)
    }

    /// Remove a pending event from the schedule.
    ///
    /// Returns `true` if the event was pending. Cancelling an unscheduled,
    /// executing or unknown event is a no-op that returns `false`.
    pub fn cancel(&mut self, id: EventId) -> bool {
        let Some(slot) = self.events.get_mut(&id) else {
            return false;
        };
        if slot.state != EventState::Pending {
            return false;
        }
        let one_shot = slot.one_shot;
        let removed = match slot.detach() {
            Some(key) => self.event_list.remove(&key),
            None => false,
        };
        debug_assert!(removed, "pending event missing from the event list");

        if one_shot {
            self.events.remove(&id);
        }
        self.stats.events_cancelled += 1;
        trace!(event = %id, time = self.now, "Event cancelled");
        removed
    }

    /// Cancel the first pending event carrying `label`.
    pub fn cancel_first_labelled(&mut self, label: &str) -> bool {
        match self.first_labelled(label) {
            Some(id) => self.cancel(id),
            None => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Continuous state
    // ═══════════════════════════════════════════════════════════════════════

    /// Continuous variables of this simulator.
    pub fn continuous(&self) -> &ContinuousState {
        &self.continuous
    }

    /// Mutable access to the continuous variables, for adding variables and
    /// selecting the integration method.
    pub fn continuous_mut(&mut self) -> &mut ContinuousState {
        &mut self.continuous
    }

    /// Start integrating a variable from its current value.
    ///
    /// The first active variable schedules the integration step event one
    /// step from now. Starting an active variable is a no-op.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownVariable`] if the variable is not ours
    /// - [`SimError::IntegrationMethodNotSelected`] before any `select_*`
    pub fn start_integration(&mut self, var: VariableId) -> Result<(), SimError> {
        let first = self.continuous.activate(var)?;
        if first {
            let step = match self.continuous.step_event() {
                Some(step) => step,
                None => {
                    let step = self.create_labelled_event(INTEGRATION_STEP, |sim, me| {
                        sim.integration_step(me)
                    });
                    self.continuous.set_step_event(step);
                    step
                }
            };
            if self.event_state(step) != Some(EventState::Pending) {
                let h = self.continuous.step_size();
                if let Err(err) = self.schedule(step, h) {
                    self.continuous.deactivate(var)?;
                    return Err(err);
                }
            }
        }
        debug!(variable = %var, time = self.now, "Integration started");
        Ok(())
    }

    /// Set a variable's value, then start integrating it.
    pub fn start_integration_at(&mut self, var: VariableId, value: f64) -> Result<(), SimError> {
        self.continuous.set_value(var, value)?;
        self.start_integration(var)
    }

    /// Stop integrating a variable. The step event is cancelled once no
    /// variable remains active.
    pub fn stop_integration(&mut self, var: VariableId) -> Result<(), SimError> {
        let none_left = self.continuous.deactivate(var)?;
        if none_left {
            if let Some(step) = self.continuous.step_event() {
                self.cancel(step);
            }
        }
        debug!(variable = %var, time = self.now, "Integration stopped");
        Ok(())
    }

    /// Action of the integration step event.
    fn integration_step(&mut self, me: EventId) {
        let h = self.continuous.step_size();
        let after_step = self.continuous.step(self.now - h);
        trace!(time = self.now, steps = self.continuous.steps(), "Integration step");

        for event in after_step {
            if self.event_state(event) == Some(EventState::Pending) {
                continue;
            }
            if let Err(err) = self.schedule_next(event) {
                warn!(event = %event, error = %err, "Cannot schedule after-step event");
            }
        }

        if !self.continuous.active_variables().is_empty() {
            if let Err(err) = self.schedule(me, h) {
                warn!(error = %err, "Integration stopped: cannot schedule next step");
                self.continuous.deactivate_all();
            }
        }
    }

    fn time_after(&self, delay: f64) -> Result<f64, SimError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }
        let time = self.now + delay;
        if !time.is_finite() {
            return Err(SimError::NotFinite(time));
        }
        Ok(time)
    }

    fn insert_pending(
        &mut self,
        id: EventId,
        time: f64,
        priority: Option<f64>,
    ) -> Result<(), SimError> {
        let slot = self.events.get_mut(&id).ok_or(SimError::UnknownEvent(id))?;
        if slot.state == EventState::Pending {
            return Err(SimError::AlreadyScheduled(id));
        }
        if let Some(priority) = priority {
            slot.priority = priority;
        }

        self.sequence += 1;
        let key = EventKey::new(time, slot.priority, self.sequence, id);
        slot.key = Some(key);
        slot.state = EventState::Pending;
        self.event_list.insert(key);
        self.stats.events_scheduled += 1;

        trace!(
            event = %id,
            time,
            priority = key.priority,
            sequence = key.sequence,
            "Event scheduled"
        );
        Ok(())
    }
}
