//! Error types for the simulation executive.

use crate::continuous::VariableId;
use simevents_eventlist::EventId;
use thiserror::Error;

/// Misuse of the simulator or of an event.
///
/// Every variant signals a programming error at the call site. None of them
/// is transient, so callers should not retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// `start()` or `run_until()` called with no pending events.
    #[error("start() called with an empty event list")]
    EmptyEventList,

    /// `start()` called while a run is already in progress.
    #[error("Simulator is already running")]
    AlreadyRunning,

    /// `init()` called while a run is in progress.
    #[error("init() called while the simulator is running")]
    InitWhileRunning,

    /// The event is already in the pending set.
    #[error("{0} is already scheduled")]
    AlreadyScheduled(EventId),

    /// The operation needs a pending event.
    #[error("{0} is not scheduled")]
    NotScheduled(EventId),

    /// Delay is negative, NaN or infinite.
    #[error("Invalid delay {0}: must be finite and non-negative")]
    InvalidDelay(f64),

    /// Absolute time or priority is NaN or infinite, or a delay overflows
    /// the clock.
    #[error("Invalid value {0}: must be finite")]
    NotFinite(f64),

    /// Absolute time lies before the current simulation time.
    #[error("Cannot schedule at time {time}, current time is {now}")]
    ScheduleInPast {
        /// Requested time.
        time: f64,
        /// Simulation clock when the request was made.
        now: f64,
    },

    /// The id does not belong to this simulator, or the event was removed.
    #[error("Unknown {0}")]
    UnknownEvent(EventId),

    /// The variable does not belong to this simulator.
    #[error("Unknown {0}")]
    UnknownVariable(VariableId),

    /// Integration started before a method and step size were selected.
    #[error("No integration method selected")]
    IntegrationMethodNotSelected,

    /// Integration step size is not a positive finite number.
    #[error("Invalid step size {0}: must be finite and positive")]
    InvalidStepSize(f64),

    /// The default simulator was re-entered from the thread already using it.
    #[error("Default simulator is already in use on this thread")]
    DefaultSimulatorBusy,
}
