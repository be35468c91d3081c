//! Time-weighted statistics over simulated time.
//!
//! [`Accumulate`] integrates a piecewise-constant quantity, such as a queue
//! length or the number of busy servers, against the simulation clock. Each
//! `update` closes the interval since the previous update at the previous
//! value and starts a new one at the new value.
//!
//! A collector outlives `Simulator::init`. When the clock is found earlier
//! than the last update, collection restarts at the current time with the
//! previous history discarded.

use crate::Simulator;
use std::fmt::Write;

/// Time-weighted statistical collector.
#[derive(Debug, Clone)]
pub struct Accumulate {
    name: Option<String>,
    /// Clock at the last `init`.
    init_time: f64,
    /// Clock at the last update.
    last_time: f64,
    /// Value held since `last_time`.
    last_value: f64,
    /// Integral of the value over `[init_time, last_time]`.
    sum: f64,
    min: f64,
    max: f64,
    collecting: bool,
}

impl Accumulate {
    /// Create a collector starting at the simulator's current time.
    pub fn new(sim: &Simulator) -> Self {
        let mut acc = Self {
            name: None,
            init_time: 0.0,
            last_time: 0.0,
            last_value: 0.0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            collecting: true,
        };
        acc.init(sim);
        acc
    }

    /// Create a named collector. The name appears in reports.
    pub fn named(sim: &Simulator, name: impl Into<String>) -> Self {
        let mut acc = Self::new(sim);
        acc.name = Some(name.into());
        acc
    }

    /// Name of the collector.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Restart collection at the current time with value zero.
    ///
    /// Starting later than time zero is how warm-up periods are excluded.
    pub fn init(&mut self, sim: &Simulator) {
        self.restart(sim.time());
    }

    fn restart(&mut self, now: f64) {
        self.init_time = now;
        self.last_time = now;
        self.last_value = 0.0;
        self.sum = 0.0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    /// Restart collection at the current time with value `x`.
    pub fn init_with(&mut self, sim: &Simulator, x: f64) {
        self.init(sim);
        self.update(sim, x);
    }

    /// Record that the value changes to `x` at the current time.
    pub fn update(&mut self, sim: &Simulator, x: f64) {
        if !self.collecting {
            return;
        }
        let now = sim.time();
        if now < self.last_time {
            // The simulator was re-initialised since the last update.
            self.restart(now);
        }
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sum += self.last_value * (now - self.last_time);
        self.last_value = x;
        self.last_time = now;
    }

    /// Extend the current value up to the current time.
    pub fn refresh(&mut self, sim: &Simulator) {
        let x = self.last_value;
        self.update(sim, x);
    }

    /// Integral of the value from the last `init` to now.
    pub fn sum(&mut self, sim: &Simulator) -> f64 {
        self.refresh(sim);
        self.sum
    }

    /// Time-average of the value from the last `init` to now.
    ///
    /// Zero if no simulated time has elapsed.
    pub fn average(&mut self, sim: &Simulator) -> f64 {
        self.refresh(sim);
        let period = self.last_time - self.init_time;
        if period > 0.0 {
            self.sum / period
        } else {
            0.0
        }
    }

    /// Smallest value recorded, `+inf` before any update.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value recorded, `-inf` before any update.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clock at the last `init`.
    pub fn init_time(&self) -> f64 {
        self.init_time
    }

    /// Clock at the last update.
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    /// Value held since the last update.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Check if updates are being recorded.
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Turn collection on or off. Updates are ignored while off.
    pub fn set_collecting(&mut self, collecting: bool) {
        self.collecting = collecting;
    }

    /// Multi-line report up to the current time.
    pub fn report(&mut self, sim: &Simulator) -> String {
        let average = self.average(sim);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "REPORT on Accumulate stat. collector ==> {}",
            self.name.as_deref().unwrap_or("")
        );
        let _ = writeln!(
            out,
            "{:>15}{:>10}{:>10}{:>12}{:>16}",
            "from time", "to time", "min", "max", "average"
        );
        let _ = writeln!(
            out,
            "{:>15.2}{:>10.2}{:>10.3}{:>12.3}{:>16.3}",
            self.init_time, self.last_time, self.min, self.max, average
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Drive `values` as (time, value) changes through a real simulation.
    fn simulate(values: &[(f64, f64)]) -> (Simulator, Arc<Mutex<Accumulate>>) {
        let mut sim = Simulator::new();
        let acc = Arc::new(Mutex::new(Accumulate::named(&sim, "queue length")));
        for &(time, value) in values {
            let acc = Arc::clone(&acc);
            let id = sim.create_event(move |sim: &mut Simulator, _| {
                acc.lock().unwrap().update(sim, value);
            });
            sim.schedule_at(id, time).unwrap();
        }
        sim.start().unwrap();
        (sim, acc)
    }

    #[test]
    fn test_time_weighted_average() {
        // 0 on [0,2), 3 on [2,6), 1 on [6,10]
        let (sim, acc) = simulate(&[(2.0, 3.0), (6.0, 1.0), (10.0, 1.0)]);
        let mut acc = acc.lock().unwrap();

        assert_eq!(acc.sum(&sim), 16.0);
        assert_eq!(acc.average(&sim), 1.6);
        assert_eq!(acc.min(), 1.0);
        assert_eq!(acc.max(), 3.0);
        assert_eq!(acc.init_time(), 0.0);
        assert_eq!(acc.last_time(), 10.0);
        assert_eq!(acc.last_value(), 1.0);
    }

    #[test]
    fn test_average_with_no_elapsed_time_is_zero() {
        let sim = Simulator::new();
        let mut acc = Accumulate::new(&sim);
        acc.update(&sim, 5.0);
        assert_eq!(acc.average(&sim), 0.0);
        assert_eq!(acc.sum(&sim), 0.0);
    }

    #[test]
    fn test_init_with_restarts_at_current_time() {
        let (sim, acc) = simulate(&[(4.0, 2.0)]);
        let mut acc = acc.lock().unwrap();
        acc.init_with(&sim, 7.0);

        assert_eq!(acc.init_time(), 4.0);
        assert_eq!(acc.last_value(), 7.0);
        assert_eq!(acc.min(), 7.0);
        assert_eq!(acc.sum(&sim), 0.0);
    }

    #[test]
    fn test_clock_reset_restarts_collection() {
        let (mut sim, acc) = simulate(&[(2.0, 3.0), (10.0, 5.0)]);
        sim.init().unwrap();

        for (time, value) in [(3.0, 2.0), (5.0, 4.0)] {
            let acc = Arc::clone(&acc);
            let id = sim.create_event(move |sim: &mut Simulator, _| {
                acc.lock().unwrap().update(sim, value);
            });
            sim.schedule_at(id, time).unwrap();
        }
        sim.start().unwrap();

        let mut acc = acc.lock().unwrap();
        // 2 on [3,5), nothing from the earlier run.
        assert_eq!(acc.init_time(), 3.0);
        assert_eq!(acc.sum(&sim), 4.0);
        assert_eq!(acc.average(&sim), 2.0);
        assert_eq!(acc.min(), 2.0);
        assert_eq!(acc.max(), 4.0);
    }

    #[test]
    fn test_updates_ignored_while_not_collecting() {
        let sim = Simulator::new();
        let mut acc = Accumulate::new(&sim);
        acc.set_collecting(false);
        acc.update(&sim, 9.0);
        assert!(!acc.is_collecting());
        assert_eq!(acc.last_value(), 0.0);
        assert_eq!(acc.max(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_report_contains_name_and_average() {
        let (sim, acc) = simulate(&[(2.0, 3.0), (6.0, 1.0), (10.0, 1.0)]);
        let report = acc.lock().unwrap().report(&sim);

        assert!(report.starts_with("REPORT on Accumulate stat. collector ==> queue length"));
        assert!(report.contains("1.600"));
        assert!(report.contains("10.00"));
    }
}
