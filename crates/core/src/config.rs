//! Simulator configuration.

use serde::{Deserialize, Serialize};
use simevents_eventlist::EventListKind;

/// Priority given to events that never had one set explicitly.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Priority used by `schedule_next`, ahead of default-priority events.
pub const NEXT_PRIORITY: f64 = 0.0;

/// Configuration for a simulator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Pending-event list strategy.
    pub event_list: EventListKind,
}

impl SimulatorConfig {
    /// Create a configuration with the default strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pending-event list strategy.
    pub fn with_event_list(mut self, kind: EventListKind) -> Self {
        self.event_list = kind;
        self
    }
}
