//! Ordering, cancellation, reentrancy and stop semantics of the executive.
//!
//! Most tests run the same scenario against every event-list strategy and
//! require identical traces: the fire order is defined by the
//! (time, priority, insertion) key alone.

use simevents_core::{EventId, EventState, RunState, SimError, Simulator, SimulatorConfig};
use simevents_test_helpers::{simulator_per_strategy, TraceLog};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_test::traced_test;

#[test]
#[traced_test]
fn test_mixed_time_and_priority_scenario() {
    // times {5, 2, 2, 8}, priorities {0, 0, 1, 0}
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        for (label, delay, priority) in [
            ("D", 5.0, 0.0),
            ("B", 2.0, 0.0),
            ("C", 2.0, 1.0),
            ("A", 8.0, 0.0),
        ] {
            let id = sim.create_event(log.recorder(label));
            sim.schedule_with_priority(id, delay, priority).unwrap();
        }

        sim.start().unwrap();

        assert_eq!(log.labels(), vec!["B", "C", "D", "A"], "{}", kind);
        assert_eq!(log.times(), vec![2.0, 2.0, 5.0, 8.0], "{}", kind);
    }
    assert!(logs_contain("Simulation finished"));
}

#[test]
fn test_equal_time_and_priority_fire_in_insertion_order() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        for label in ["first", "second", "third"] {
            log.schedule(&mut sim, label, 4.0);
        }
        // Something earlier, scheduled last, must not disturb the tie.
        log.schedule(&mut sim, "early", 1.0);

        sim.start().unwrap();
        assert_eq!(
            log.labels(),
            vec!["early", "first", "second", "third"],
            "{}",
            kind
        );
    }
}

#[test]
fn test_clock_is_monotonic_and_matches_event_times() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        let delays = [3.5, 0.0, 9.25, 1.0, 1.0, 7.0, 0.5, 3.5];
        for (i, delay) in delays.iter().enumerate() {
            log.schedule(&mut sim, &format!("e{i}"), *delay);
        }

        sim.start().unwrap();

        let times = log.times();
        assert_eq!(times.len(), delays.len(), "{}", kind);
        assert!(times.windows(2).all(|w| w[0] <= w[1]), "{}", kind);
        let mut sorted = delays.to_vec();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(times, sorted, "{}", kind);
        assert_eq!(sim.time(), 9.25, "{}", kind);
    }
}

#[test]
fn test_cancelled_event_never_fires() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        let a = log.schedule(&mut sim, "a", 1.0);
        let b = log.schedule(&mut sim, "b", 2.0);
        let c = log.schedule(&mut sim, "c", 3.0);

        assert!(sim.cancel(b), "{}", kind);
        assert!(!sim.cancel(b), "{}", kind);
        assert_eq!(sim.pending_events(), vec![a, c], "{}", kind);

        sim.start().unwrap();
        assert_eq!(log.labels(), vec!["a", "c"], "{}", kind);
    }
}

#[test]
fn test_action_can_cancel_a_later_event() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        let victim = log.schedule(&mut sim, "victim", 5.0);

        let mut record = log.recorder("killer");
        let killer = sim.create_event(move |sim: &mut Simulator, me| {
            record(sim, me);
            assert!(sim.cancel(victim));
            assert!(!sim.cancel(victim));
        });
        sim.schedule(killer, 2.0).unwrap();

        sim.start().unwrap();
        assert_eq!(log.labels(), vec!["killer"], "{}", kind);
        assert_eq!(sim.event_state(victim), Some(EventState::Unscheduled));
    }
}

#[test]
fn test_self_rescheduling_events_fire_exact_count() {
    const EVENTS: u64 = 25;
    const FIRINGS_EACH: u64 = 40;

    for (kind, mut sim) in simulator_per_strategy() {
        let fired = Arc::new(AtomicU64::new(0));
        for i in 0..EVENTS {
            let fired = Arc::clone(&fired);
            let mut remaining = FIRINGS_EACH;
            let id = sim.create_event(move |sim: &mut Simulator, me: EventId| {
                fired.fetch_add(1, Ordering::SeqCst);
                remaining -= 1;
                if remaining > 0 {
                    // Alternate same-instant and future rescheduling.
                    let delay = if remaining % 2 == 0 { 0.0 } else { 1.0 + i as f64 * 0.01 };
                    sim.schedule(me, delay).unwrap();
                    assert_eq!(sim.event_state(me), Some(EventState::Pending));
                }
            });
            sim.schedule(id, i as f64 * 0.1).unwrap();
        }

        sim.start().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), EVENTS * FIRINGS_EACH, "{}", kind);
        assert_eq!(sim.stats().events_processed, EVENTS * FIRINGS_EACH, "{}", kind);
        assert_eq!(sim.pending_len(), 0, "{}", kind);
    }
}

#[test]
fn test_action_scheduling_at_current_time_fires_in_same_run() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        let follow_up = sim.create_event(log.recorder("follow-up"));
        log.schedule(&mut sim, "later", 3.0);

        let mut record = log.recorder("trigger");
        let trigger = sim.create_event(move |sim: &mut Simulator, me| {
            record(sim, me);
            sim.schedule(follow_up, 0.0).unwrap();
        });
        sim.schedule(trigger, 3.0).unwrap();

        sim.start().unwrap();
        // follow-up was inserted after "later", so it fires after it.
        assert_eq!(log.labels(), vec!["later", "trigger", "follow-up"], "{}", kind);
        assert_eq!(log.times(), vec![3.0, 3.0, 3.0], "{}", kind);
    }
}

#[test]
fn test_stop_leaves_remaining_events_for_next_start() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        log.schedule(&mut sim, "before", 1.0);

        let mut record = log.recorder("stopper");
        let stopper = sim.create_event(move |sim: &mut Simulator, me| {
            record(sim, me);
            sim.stop();
            assert_eq!(sim.state(), RunState::StopRequested);
        });
        sim.schedule(stopper, 2.0).unwrap();
        // Same instant but later in tie order, and strictly later.
        log.schedule(&mut sim, "tied", 2.0);
        log.schedule(&mut sim, "after", 3.0);

        sim.start().unwrap();

        assert_eq!(log.labels(), vec!["before", "stopper"], "{}", kind);
        assert_eq!(sim.time(), 2.0, "{}", kind);
        assert_eq!(sim.state(), RunState::Idle, "{}", kind);
        assert_eq!(sim.pending_len(), 2, "{}", kind);

        sim.start().unwrap();
        assert_eq!(
            log.labels(),
            vec!["before", "stopper", "tied", "after"],
            "{}",
            kind
        );
        assert_eq!(sim.stats().runs, 2, "{}", kind);
        assert_eq!(sim.stats().stops, 1, "{}", kind);
    }
}

#[test]
fn test_init_then_start_without_events_fails() {
    for (kind, mut sim) in simulator_per_strategy() {
        let log = TraceLog::new();
        log.schedule(&mut sim, "discarded", 1.0);

        sim.init().unwrap();
        assert_eq!(sim.start(), Err(SimError::EmptyEventList), "{}", kind);
        assert!(log.is_empty(), "{}", kind);
    }
}

#[test]
fn test_identical_traces_across_strategies() {
    // A small self-driving model: each arrival schedules the next one and a
    // departure; departures sometimes postpone the next pending arrival.
    fn run(mut sim: Simulator) -> Vec<(String, f64)> {
        let log = TraceLog::new();
        let arrivals = Arc::new(AtomicU64::new(0));

        let departure_log = log.clone();
        let departure = sim.create_labelled_event("departure", move |sim: &mut Simulator, _| {
            departure_log.record("departure", sim.time());
            if sim.time() as u64 % 3 == 0 {
                if let Some(arrival) = sim.first_labelled("arrival") {
                    sim.reschedule(arrival, 1.0).unwrap();
                }
            }
        });

        let arrival_log = log.clone();
        let counter = Arc::clone(&arrivals);
        let arrival = sim.create_labelled_event("arrival", move |sim: &mut Simulator, me| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            arrival_log.record(format!("arrival-{n}"), sim.time());
            if n < 30 {
                sim.schedule(me, ((n * 7) % 5) as f64).unwrap();
            }
            if sim.event_state(departure) != Some(EventState::Pending) {
                sim.schedule(departure, ((n * 3) % 4) as f64).unwrap();
            }
        });

        sim.schedule(arrival, 0.0).unwrap();
        sim.start().unwrap();
        log.snapshot()
            .into_iter()
            .map(|e| (e.label, e.time))
            .collect()
    }

    let mut traces = simulator_per_strategy()
        .into_iter()
        .map(|(kind, sim)| (kind, run(sim)));
    let (_, reference) = traces.next().unwrap();
    assert!(reference.len() > 10);
    for (kind, trace) in traces {
        assert_eq!(trace, reference, "{} diverged", kind);
    }
}

#[test]
fn test_ids_from_another_simulator_are_rejected() {
    for (kind, mut b) in simulator_per_strategy() {
        let mut a = Simulator::with_config(SimulatorConfig::new().with_event_list(kind));
        let log = TraceLog::new();
        let id_a = log.schedule(&mut a, "a", 1.0);
        let id_b = log.schedule(&mut b, "b", 1.0);
        assert_ne!(id_a, id_b, "{}", kind);
        assert!(a.owns(id_a) && !b.owns(id_a), "{}", kind);

        assert!(!b.cancel(id_a), "{}", kind);
        assert_eq!(b.event_state(id_b), Some(EventState::Pending), "{}", kind);
        assert_eq!(b.event_state(id_a), None, "{}", kind);
        assert_eq!(b.event_time(id_a), None, "{}", kind);
        assert_eq!(b.schedule(id_a, 2.0), Err(SimError::UnknownEvent(id_a)), "{}", kind);
        assert_eq!(b.reschedule(id_a, 2.0), Err(SimError::UnknownEvent(id_a)), "{}", kind);
        assert_eq!(b.set_priority(id_a, 0.0), Err(SimError::UnknownEvent(id_a)), "{}", kind);
        assert!(!b.remove_event(id_a), "{}", kind);
        assert_eq!(b.pending_events(), vec![id_b], "{}", kind);

        b.start().unwrap();
        assert_eq!(log.labels(), vec!["b"], "{}", kind);
        a.start().unwrap();
        assert_eq!(log.labels(), vec!["b", "a"], "{}", kind);
    }
}
