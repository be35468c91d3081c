//! Event lifecycle types.

use crate::Simulator;
use simevents_eventlist::{EventId, EventKey};
use std::fmt;

/// Lifecycle state of an event.
///
/// ```text
///                schedule              dispatch
/// Unscheduled ─────────────▶ Pending ─────────────▶ Executing
///      ▲                        │                       │
///      │         cancel         │    action returns     │
///      └────────────────────────┴───────────────────────┘
/// ```
///
/// An executing event may schedule itself again, in which case it is
/// `Pending` when its action returns and stays that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    /// Not in the pending set.
    Unscheduled,
    /// In the pending set, waiting for its time.
    Pending,
    /// Its action is running right now.
    Executing,
}

/// Behaviour run when an event fires.
///
/// The action receives the simulator that dispatched it and the id of the
/// firing event, so it can reschedule itself, schedule or cancel other
/// events, or stop the run. The event is already detached from the pending
/// set when this is called.
///
/// Closures of the form `FnMut(&mut Simulator, EventId) + Send` implement
/// this trait.
pub trait Action: Send {
    /// Run the event's behaviour.
    fn fire(&mut self, sim: &mut Simulator, event: EventId);
}

impl<F> Action for F
where
    F: FnMut(&mut Simulator, EventId) + Send,
{
    fn fire(&mut self, sim: &mut Simulator, event: EventId) {
        self(sim, event)
    }
}

/// Per-event record kept by the simulator.
pub(crate) struct EventSlot {
    /// Taken out while the action runs, put back afterwards.
    pub(crate) action: Option<Box<dyn Action>>,
    pub(crate) state: EventState,
    /// Present exactly while the event is pending.
    pub(crate) key: Option<EventKey>,
    pub(crate) priority: f64,
    pub(crate) label: Option<&'static str>,
    /// Dropped from the simulator once it fires or is cancelled.
    pub(crate) one_shot: bool,
}

impl EventSlot {
    pub(crate) fn new(
        action: Box<dyn Action>,
        priority: f64,
        label: Option<&'static str>,
        one_shot: bool,
    ) -> Self {
        Self {
            action: Some(action),
            state: EventState::Unscheduled,
            key: None,
            priority,
            label,
            one_shot,
        }
    }

    /// Leave the pending set.
    pub(crate) fn detach(&mut self) -> Option<EventKey> {
        if self.state == EventState::Pending {
            self.state = EventState::Unscheduled;
        }
        self.key.take()
    }
}

impl fmt::Debug for EventSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSlot")
            .field("state", &self.state)
            .field("key", &self.key)
            .field("priority", &self.priority)
            .field("label", &self.label)
            .field("one_shot", &self.one_shot)
            .finish_non_exhaustive()
    }
}
