//! Discrete-event simulation executive.
//!
//! This crate provides the clock, event lifecycle, and dispatch loop of a
//! single-threaded discrete-event simulator. Given the same schedule it
//! fires events in the same order every run, whichever event-list strategy
//! backs it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Simulator                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event List (Box<dyn EventList>)                │ │
//! │  │     Ordered by: time, priority, sequence           │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ remove_first                │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     clock := event time                            │ │
//! │  │     events: HashMap<EventId, EventSlot>            │ │
//! │  │     action(&mut Simulator, EventId)                │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Actions → schedule / cancel / stop             │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The firing event is removed from the list before its action runs, so an
//! action can freely schedule, cancel, or reschedule any event, itself
//! included.
//!
//! Around the executive sit the statistical collectors ([`Accumulate`],
//! [`Tally`], [`ListWithStat`]) and [`ContinuousState`], whose variables are
//! integrated by a recurring step event.

mod accumulate;
mod config;
mod continuous;
mod error;
mod event;
mod list_stat;
mod registry;
mod simulator;
mod tally;

pub use accumulate::Accumulate;
pub use config::{SimulatorConfig, DEFAULT_PRIORITY, NEXT_PRIORITY};
pub use continuous::{ContinuousState, Derivative, IntegrationMethod, StateValues, VariableId};
pub use error::SimError;
pub use event::{Action, EventState};
pub use list_stat::ListWithStat;
pub use registry::DefaultSimulator;
pub use simulator::{RunState, SimulationStats, Simulator, INTEGRATION_STEP};
pub use tally::Tally;

pub use simevents_eventlist::{EventId, EventKey, EventList, EventListKind};
