//! Statistics over individual observations.

use std::fmt::Write;

/// Collector of independent observations, such as waiting times.
///
/// Mean and variance are updated incrementally (Welford), so the collector
/// keeps no samples.
#[derive(Debug, Clone)]
pub struct Tally {
    name: Option<String>,
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
    min: f64,
    max: f64,
    collecting: bool,
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

impl Tally {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            name: None,
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            collecting: true,
        }
    }

    /// Create an empty named collector.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Name of the collector.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Forget every observation.
    pub fn init(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    /// Record one observation. Ignored while not collecting.
    pub fn add(&mut self, x: f64) {
        if !self.collecting {
            return;
        }
        self.count += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of the observations.
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Sample mean, `None` without observations.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (n - 1 denominator), `None` with fewer than two
    /// observations.
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// Sample standard deviation.
    pub fn standard_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Smallest observation, `+inf` when empty.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observation, `-inf` when empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Check if observations are being recorded.
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Turn collection on or off.
    pub fn set_collecting(&mut self, collecting: bool) {
        self.collecting = collecting;
    }

    /// Multi-line report.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "REPORT on Tally stat. collector ==> {}",
            self.name.as_deref().unwrap_or("")
        );
        let _ = writeln!(
            out,
            "{:>10}{:>10}{:>12}{:>16}{:>10}",
            "min", "max", "average", "standard dev.", "num. obs."
        );
        let _ = writeln!(
            out,
            "{:>10.3}{:>10.3}{:>12.3}{:>16.3}{:>10}",
            self.min,
            self.max,
            self.average().unwrap_or(f64::NAN),
            self.standard_deviation().unwrap_or(f64::NAN),
            self.count
        );
        out
    }
}
