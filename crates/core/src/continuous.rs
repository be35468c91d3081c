//! Continuous-state variables integrated alongside discrete events.
//!
//! A [`ContinuousState`] holds variables whose evolution is given by a
//! derivative `dy/dt = f(t, state)`. While at least one variable is being
//! integrated, the simulator keeps a step event pending every `h` time
//! units; each firing advances every active variable over `[t - h, t]`
//! with the selected method.
//!
//! ```text
//!  t-h                         t
//!   │──────── one step ────────│
//!   ▼                          ▼
//!  values ── Euler / RK2 / RK4 ──▶ values ──▶ after-step events (schedule_next)
//! ```
//!
//! Derivatives only read state. Anything that must react to a new value,
//! such as stopping integration when a threshold is crossed, goes in an
//! after-step event, which fires at the same instant right after the step.

use crate::SimError;
use serde::{Deserialize, Serialize};
use simevents_eventlist::EventId;
use std::fmt;
use std::ops::Index;

/// Numerical integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Forward Euler, first order.
    Euler,
    /// Runge-Kutta of order 2 (Heun).
    RungeKutta2,
    /// Classical Runge-Kutta of order 4.
    RungeKutta4,
}

impl IntegrationMethod {
    fn tableau(self) -> &'static Tableau {
        match self {
            IntegrationMethod::Euler => &EULER,
            IntegrationMethod::RungeKutta2 => &RUNGE_KUTTA_2,
            IntegrationMethod::RungeKutta4 => &RUNGE_KUTTA_4,
        }
    }
}

/// Explicit Runge-Kutta coefficients.
///
/// Stage `i` evaluates the slope at `t + h * c[i]`; intermediate stages move
/// the state to `y0 + h * a[i] * slope`; the step result is
/// `y0 + h * Σ b[i] * slope_i`.
struct Tableau {
    a: &'static [f64],
    b: &'static [f64],
    c: &'static [f64],
}

const EULER: Tableau = Tableau {
    a: &[],
    b: &[1.0],
    c: &[0.0],
};

const RUNGE_KUTTA_2: Tableau = Tableau {
    a: &[1.0],
    b: &[0.5, 0.5],
    c: &[0.0, 1.0],
};

const RUNGE_KUTTA_4: Tableau = Tableau {
    a: &[0.5, 0.5, 1.0],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    c: &[0.0, 0.5, 0.5, 1.0],
};

/// Handle to a continuous variable of one simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId {
    owner: u64,
    index: usize,
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variable#{}.{}", self.owner, self.index)
    }
}

/// Read-only view of every variable's value, passed to derivatives.
#[derive(Debug, Clone, Copy)]
pub struct StateValues<'a> {
    values: &'a [f64],
    /// Variable whose derivative is being evaluated.
    own: usize,
}

impl StateValues<'_> {
    /// Value of the variable whose derivative is being evaluated.
    pub fn own(&self) -> f64 {
        self.values[self.own]
    }

    /// Current value of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by the same state.
    pub fn value(&self, id: VariableId) -> f64 {
        self.values[id.index]
    }
}

impl Index<VariableId> for StateValues<'_> {
    type Output = f64;

    fn index(&self, id: VariableId) -> &f64 {
        &self.values[id.index]
    }
}

/// Derivative of a variable: `f(t, state) -> dy/dt`.
pub type Derivative = Box<dyn Fn(f64, &StateValues<'_>) -> f64 + Send>;

struct Variable {
    name: Option<&'static str>,
    derivative: Derivative,
    active: bool,
    after_step: Option<EventId>,
}

/// The continuous variables of one simulator and how they are integrated.
pub struct ContinuousState {
    owner: u64,
    method: Option<IntegrationMethod>,
    step_size: f64,
    values: Vec<f64>,
    variables: Vec<Variable>,
    /// Variables being integrated, in the order they were started.
    active: Vec<VariableId>,
    step_event: Option<EventId>,
    steps: u64,
}

impl fmt::Debug for ContinuousState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuousState")
            .field("method", &self.method)
            .field("step_size", &self.step_size)
            .field("values", &self.values)
            .field("active", &self.active)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl ContinuousState {
    pub(crate) fn new(owner: u64) -> Self {
        Self {
            owner,
            method: None,
            step_size: 0.0,
            values: Vec::new(),
            variables: Vec::new(),
            active: Vec::new(),
            step_event: None,
            steps: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Method selection
    // ═══════════════════════════════════════════════════════════════════════

    /// Integrate with `method` and step size `h`.
    ///
    /// Takes effect from the next step.
    pub fn select(&mut self, method: IntegrationMethod, h: f64) -> Result<(), SimError> {
        if !h.is_finite() || h <= 0.0 {
            return Err(SimError::InvalidStepSize(h));
        }
        self.method = Some(method);
        self.step_size = h;
        Ok(())
    }

    /// Integrate with forward Euler and step size `h`.
    pub fn select_euler(&mut self, h: f64) -> Result<(), SimError> {
        self.select(IntegrationMethod::Euler, h)
    }

    /// Integrate with second-order Runge-Kutta and step size `h`.
    pub fn select_runge_kutta2(&mut self, h: f64) -> Result<(), SimError> {
        self.select(IntegrationMethod::RungeKutta2, h)
    }

    /// Integrate with fourth-order Runge-Kutta and step size `h`.
    pub fn select_runge_kutta4(&mut self, h: f64) -> Result<(), SimError> {
        self.select(IntegrationMethod::RungeKutta4, h)
    }

    /// Selected method, `None` until one is selected.
    pub fn method(&self) -> Option<IntegrationMethod> {
        self.method
    }

    /// Integration step size.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Integration steps performed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a variable with an initial value. It is not integrated until
    /// started with [`Simulator::start_integration`](crate::Simulator::start_integration).
    pub fn add_variable<F>(&mut self, value: f64, derivative: F) -> VariableId
    where
        F: Fn(f64, &StateValues<'_>) -> f64 + Send + 'static,
    {
        self.push_variable(None, value, Box::new(derivative))
    }

    /// Add a named variable.
    pub fn add_named_variable<F>(
        &mut self,
        name: &'static str,
        value: f64,
        derivative: F,
    ) -> VariableId
    where
        F: Fn(f64, &StateValues<'_>) -> f64 + Send + 'static,
    {
        self.push_variable(Some(name), value, Box::new(derivative))
    }

    fn push_variable(
        &mut self,
        name: Option<&'static str>,
        value: f64,
        derivative: Derivative,
    ) -> VariableId {
        let id = VariableId {
            owner: self.owner,
            index: self.variables.len(),
        };
        self.values.push(value);
        self.variables.push(Variable {
            name,
            derivative,
            active: false,
            after_step: None,
        });
        id
    }

    fn check(&self, id: VariableId) -> Result<usize, SimError> {
        if id.owner != self.owner || id.index >= self.variables.len() {
            return Err(SimError::UnknownVariable(id));
        }
        Ok(id.index)
    }

    /// Replace the derivative of a variable.
    ///
    /// Coupled systems create every variable first, then wire derivatives
    /// that read each other's values.
    pub fn set_derivative<F>(&mut self, id: VariableId, derivative: F) -> Result<(), SimError>
    where
        F: Fn(f64, &StateValues<'_>) -> f64 + Send + 'static,
    {
        let i = self.check(id)?;
        self.variables[i].derivative = Box::new(derivative);
        Ok(())
    }

    /// Current value of a variable, `None` if unknown.
    pub fn value(&self, id: VariableId) -> Option<f64> {
        self.check(id).ok().map(|i| self.values[i])
    }

    /// Overwrite the value of a variable.
    pub fn set_value(&mut self, id: VariableId, value: f64) -> Result<(), SimError> {
        let i = self.check(id)?;
        self.values[i] = value;
        Ok(())
    }

    /// Name of a variable, if it was created with one.
    pub fn name(&self, id: VariableId) -> Option<&'static str> {
        self.check(id).ok().and_then(|i| self.variables[i].name)
    }

    /// Check if a variable is being integrated.
    pub fn is_active(&self, id: VariableId) -> bool {
        self.check(id).is_ok_and(|i| self.variables[i].active)
    }

    /// Variables being integrated.
    pub fn active_variables(&self) -> &[VariableId] {
        &self.active
    }

    /// Event fired with `schedule_next` after every step that integrates
    /// `id`. `None` removes it.
    pub fn set_after_step(&mut self, id: VariableId, event: Option<EventId>) -> Result<(), SimError> {
        let i = self.check(id)?;
        self.variables[i].after_step = event;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Driven by the simulator
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn step_event(&self) -> Option<EventId> {
        self.step_event
    }

    pub(crate) fn set_step_event(&mut self, event: EventId) {
        self.step_event = Some(event);
    }

    /// Mark `id` active. Returns `true` if it was the first active variable.
    pub(crate) fn activate(&mut self, id: VariableId) -> Result<bool, SimError> {
        let i = self.check(id)?;
        if self.method.is_none() {
            return Err(SimError::IntegrationMethodNotSelected);
        }
        if self.variables[i].active {
            return Ok(false);
        }
        self.variables[i].active = true;
        self.active.push(id);
        Ok(self.active.len() == 1)
    }

    /// Mark `id` inactive. Returns `true` if no variable remains active.
    pub(crate) fn deactivate(&mut self, id: VariableId) -> Result<bool, SimError> {
        let i = self.check(id)?;
        if self.variables[i].active {
            self.variables[i].active = false;
            self.active.retain(|active| *active != id);
        }
        Ok(self.active.is_empty())
    }

    pub(crate) fn deactivate_all(&mut self) {
        for id in self.active.drain(..) {
            self.variables[id.index].active = false;
        }
    }

    /// Advance every active variable from `t` to `t + step_size`.
    ///
    /// Returns the after-step events to fire.
    pub(crate) fn step(&mut self, t: f64) -> Vec<EventId> {
        let Some(method) = self.method else {
            return Vec::new();
        };
        let tableau = method.tableau();
        let h = self.step_size;
        let stages = tableau.b.len();

        let start: Vec<f64> = self.active.iter().map(|id| self.values[id.index]).collect();
        let mut weighted = vec![0.0; start.len()];

        for stage in 0..stages - 1 {
            let slopes = self.slopes(t + h * tableau.c[stage]);
            let next: Vec<f64> = slopes
                .iter()
                .enumerate()
                .map(|(i, slope)| {
                    weighted[i] += slope * tableau.b[stage];
                    start[i] + h * slope * tableau.a[stage]
                })
                .collect();
            self.assign(&next);
        }

        let last = stages - 1;
        let slopes = self.slopes(t + h * tableau.c[last]);
        let next: Vec<f64> = slopes
            .iter()
            .enumerate()
            .map(|(i, slope)| start[i] + h * (weighted[i] + slope * tableau.b[last]))
            .collect();
        self.assign(&next);

        self.steps += 1;
        self.active
            .iter()
            .filter_map(|id| self.variables[id.index].after_step)
            .collect()
    }

    fn slopes(&self, t: f64) -> Vec<f64> {
        self.active
            .iter()
            .map(|id| {
                let state = StateValues {
                    values: &self.values,
                    own: id.index,
                };
                (self.variables[id.index].derivative)(t, &state)
            })
            .collect()
    }

    fn assign(&mut self, next: &[f64]) {
        for (id, value) in self.active.iter().zip(next) {
            self.values[id.index] = *value;
        }
    }
}
