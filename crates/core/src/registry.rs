//! Process-wide default simulator.
//!
//! Small programs often need exactly one simulator. Instead of threading it
//! through every call they can use [`DefaultSimulator`], a single slot that
//! lazily constructs a [`Simulator`] on first use and can be replaced or
//! taken out explicitly.
//!
//! Access is serialised by a mutex. An action started through
//! [`DefaultSimulator::start`] already holds the slot, so it must use the
//! `&mut Simulator` it receives; touching the registry again from that
//! thread returns [`SimError::DefaultSimulatorBusy`] instead of deadlocking.

use crate::{SimError, Simulator};
use std::cell::Cell;
use std::sync::{Mutex, MutexGuard, PoisonError};

static DEFAULT_SIMULATOR: Mutex<Option<Simulator>> = Mutex::new(None);

thread_local! {
    static ENTERED: Cell<bool> = const { Cell::new(false) };
}

/// Marks the registry as in use on this thread until dropped.
struct Entered;

impl Entered {
    fn enter() -> Result<Self, SimError> {
        if ENTERED.with(|entered| entered.replace(true)) {
            return Err(SimError::DefaultSimulatorBusy);
        }
        Ok(Entered)
    }
}

impl Drop for Entered {
    fn drop(&mut self) {
        ENTERED.with(|entered| entered.set(false));
    }
}

fn lock_slot() -> MutexGuard<'static, Option<Simulator>> {
    // A panicking action poisons the lock, but the simulator itself resets
    // to Idle before the panic escapes, so the value is still usable.
    DEFAULT_SIMULATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the process-wide default simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSimulator;

impl DefaultSimulator {
    /// Run `f` against the default simulator, creating it if needed.
    pub fn with<R>(f: impl FnOnce(&mut Simulator) -> R) -> Result<R, SimError> {
        let _entered = Entered::enter()?;
        let mut slot = lock_slot();
        let sim = slot.get_or_insert_with(Simulator::new);
        Ok(f(sim))
    }

    /// Install `sim` as the default, returning the previous one.
    pub fn set(sim: Simulator) -> Result<Option<Simulator>, SimError> {
        let _entered = Entered::enter()?;
        Ok(lock_slot().replace(sim))
    }

    /// Remove the default simulator. The next access creates a fresh one.
    pub fn take() -> Result<Option<Simulator>, SimError> {
        let _entered = Entered::enter()?;
        Ok(lock_slot().take())
    }

    /// Check if a default simulator has been created or installed.
    pub fn is_set() -> Result<bool, SimError> {
        let _entered = Entered::enter()?;
        Ok(lock_slot().is_some())
    }

    /// Current time of the default simulator.
    pub fn time() -> Result<f64, SimError> {
        Self::with(|sim| sim.time())
    }

    /// [`Simulator::init`] on the default simulator.
    pub fn init() -> Result<(), SimError> {
        Self::with(Simulator::init)?
    }

    /// [`Simulator::start`] on the default simulator.
    pub fn start() -> Result<(), SimError> {
        Self::with(Simulator::start)?
    }

    /// [`Simulator::stop`] on the default simulator.
    pub fn stop() -> Result<(), SimError> {
        Self::with(Simulator::stop)
    }
}
