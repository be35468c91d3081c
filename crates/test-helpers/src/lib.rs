//! Test helpers for simevents.
//!
//! Provides a shared trace recorder that event actions append to, and
//! fixtures that build one simulator per event-list strategy so a test can
//! assert identical behaviour across all of them.

use simevents_core::{EventId, EventListKind, Simulator, SimulatorConfig};
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded firing.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// Label given to the recorder.
    pub label: String,
    /// Simulation time when the action ran.
    pub time: f64,
}

/// Shared, cloneable log of fired actions.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Arc<Mutex<Vec<TraceEntry>>>,
}

impl TraceLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<TraceEntry>> {
        self.entries.lock().expect("trace log poisoned")
    }

    /// Append an entry.
    pub fn record(&self, label: impl Into<String>, time: f64) {
        self.entries().push(TraceEntry {
            label: label.into(),
            time,
        });
    }

    /// An event action that records `label` at the firing time.
    pub fn recorder(
        &self,
        label: impl Into<String>,
    ) -> impl FnMut(&mut Simulator, EventId) + Send + 'static {
        let log = self.clone();
        let label = label.into();
        move |sim: &mut Simulator, _| log.record(label.clone(), sim.time())
    }

    /// Create an event on `sim` that records `label`, and schedule it.
    pub fn schedule(&self, sim: &mut Simulator, label: &str, delay: f64) -> EventId {
        let id = sim.create_event(self.recorder(label));
        sim.schedule(id, delay).expect("schedule traced event");
        id
    }

    /// Labels in firing order.
    pub fn labels(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.label.clone()).collect()
    }

    /// Firing times in order.
    pub fn times(&self) -> Vec<f64> {
        self.entries().iter().map(|e| e.time).collect()
    }

    /// Every entry recorded so far.
    pub fn snapshot(&self) -> Vec<TraceEntry> {
        self.entries().clone()
    }

    /// Number of recorded firings.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if nothing has fired.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }
}

/// One fresh simulator per event-list strategy.
pub fn simulator_per_strategy() -> Vec<(EventListKind, Simulator)> {
    EventListKind::ALL
        .into_iter()
        .map(|kind| {
            let config = SimulatorConfig::default().with_event_list(kind);
            (kind, Simulator::with_config(config))
        })
        .collect()
}
