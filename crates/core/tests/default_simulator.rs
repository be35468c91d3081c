//! The process-wide default simulator.
//!
//! The slot is shared by every test in this binary, so each test holds
//! `SERIAL` and starts from an empty slot.

use simevents_core::{DefaultSimulator, EventListKind, SimError, Simulator, SimulatorConfig};
use simevents_test_helpers::TraceLog;
use std::sync::{Mutex, MutexGuard, PoisonError};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    DefaultSimulator::take().unwrap();
    guard
}

#[test]
fn test_created_lazily_on_first_use() {
    let _serial = serial();
    assert!(!DefaultSimulator::is_set().unwrap());

    assert_eq!(DefaultSimulator::time().unwrap(), 0.0);
    assert!(DefaultSimulator::is_set().unwrap());
}

#[test]
fn test_schedule_and_start_through_default() {
    let _serial = serial();
    let log = TraceLog::new();

    DefaultSimulator::with(|sim| {
        log.schedule(sim, "a", 1.0);
        log.schedule(sim, "b", 3.0);
    })
    .unwrap();
    DefaultSimulator::start().unwrap();

    assert_eq!(log.labels(), vec!["a", "b"]);
    assert_eq!(DefaultSimulator::time().unwrap(), 3.0);

    DefaultSimulator::init().unwrap();
    assert_eq!(DefaultSimulator::time().unwrap(), 0.0);
    assert_eq!(DefaultSimulator::start(), Err(SimError::EmptyEventList));
}

#[test]
fn test_set_replaces_and_take_removes() {
    let _serial = serial();

    let config = SimulatorConfig::new().with_event_list(EventListKind::BinaryHeap);
    assert!(DefaultSimulator::set(Simulator::with_config(config))
        .unwrap()
        .is_none());
    let strategy = DefaultSimulator::with(|sim| sim.event_list().name()).unwrap();
    assert_eq!(strategy, "binary_heap");

    let previous = DefaultSimulator::set(Simulator::new()).unwrap();
    assert_eq!(previous.map(|sim| sim.event_list().name()), Some("binary_heap"));

    let taken = DefaultSimulator::take().unwrap();
    assert!(taken.is_some());
    assert!(!DefaultSimulator::is_set().unwrap());
}

#[test]
fn test_reentry_from_action_is_busy() {
    let _serial = serial();
    let log = TraceLog::new();

    DefaultSimulator::with(|sim| {
        let log = log.clone();
        let id = sim.create_event(move |sim: &mut Simulator, _| {
            assert_eq!(DefaultSimulator::time(), Err(SimError::DefaultSimulatorBusy));
            assert_eq!(DefaultSimulator::stop(), Err(SimError::DefaultSimulatorBusy));
            // The simulator handed to the action is the one to use.
            log.record("inner", sim.time());
            sim.stop();
        });
        sim.schedule(id, 2.0).unwrap();
    })
    .unwrap();
    DefaultSimulator::start().unwrap();

    assert_eq!(log.labels(), vec!["inner"]);
    // The busy flag is cleared once the outer access returns.
    assert_eq!(DefaultSimulator::time().unwrap(), 2.0);
}

#[test]
fn test_nested_with_is_busy() {
    let _serial = serial();

    let inner = DefaultSimulator::with(|_| DefaultSimulator::is_set()).unwrap();
    assert_eq!(inner, Err(SimError::DefaultSimulatorBusy));
}

#[test]
fn test_stop_outside_a_run_is_harmless() {
    let _serial = serial();
    DefaultSimulator::stop().unwrap();
    assert_eq!(
        DefaultSimulator::with(|sim| sim.stats().stops).unwrap(),
        0
    );
}
