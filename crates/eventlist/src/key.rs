//! Ordering key for pending events.

use std::cmp::Ordering;
use std::fmt;

/// Identity of an event.
///
/// An id pairs the tag of the simulator that created it with an index that
/// simulator never reuses, so ids from different simulators never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId {
    owner: u64,
    index: u64,
}

impl EventId {
    /// Create an id for event `index` of the simulator tagged `owner`.
    pub fn new(owner: u64, index: u64) -> Self {
        Self { owner, index }
    }

    /// Tag of the simulator that created the event.
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Position of the event in its simulator's creation order.
    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}.{}", self.owner, self.index)
    }
}

/// Key for ordering events in a pending-event list.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Priority (lower value first)
/// 3. Sequence number (FIFO for same time/priority)
///
/// The id is carried along so a list can hand back which event is due, but
/// it never takes part in the ordering: sequence numbers are unique per
/// simulator, so two distinct keys never compare equal.
#[derive(Debug, Clone, Copy)]
pub struct EventKey {
    /// Simulated time at which the event fires.
    pub time: f64,
    /// Tie-break for events at the same time.
    pub priority: f64,
    /// Insertion stamp for deterministic FIFO ordering.
    pub sequence: u64,
    /// The event this key belongs to.
    pub id: EventId,
}

impl EventKey {
    /// Create a new event key.
    pub fn new(time: f64, priority: f64, sequence: u64, id: EventId) -> Self {
        Self {
            time,
            priority,
            sequence,
            id,
        }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by time first
        match self.time.total_cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Then by priority
        match self.priority.total_cmp(&other.priority) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Finally by sequence (FIFO)
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EventKey {}
