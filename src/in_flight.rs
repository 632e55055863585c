use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Action, Error, Result};

/// "Operation in flight" flag for one independent action.
///
/// The flag is only ever set through [`InFlight::try_acquire`] and cleared when the returned
/// guard drops, so every exit path (success, error, cancelled future, panic) releases it.
#[derive(Debug)]
pub struct InFlight {
    action: Action,
    busy: AtomicBool,
}

impl InFlight {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            busy: AtomicBool::new(false),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mark the action as running, or fail with [`Error::Busy`] if it already is.
    pub fn try_acquire(&self) -> Result<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy(self.action))?;
        Ok(InFlightGuard { flag: &self.busy })
    }
}

/// Clears its [`InFlight`] flag on drop.
#[derive(Debug)]
#[must_use = "the action is only marked in flight while the guard is alive"]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
