//! Shared access to a cell for concurrent hosts
//!
//! A [`FreewayCell`] is single-writer. Hosts that dispatch events from
//! several threads wrap it in a [`SharedFreewayCell`]: one mutex, held for
//! the whole dispatch, so every event is applied atomically with respect to
//! the others.
//!
//! A panic while the lock is held poisons it. The cell only ever changes
//! through complete filter steps, so the guard is recovered and the host
//! keeps running.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    cell::{Dispatch, FreewayCell},
    events::MeasurementEvent,
};

/// Cloneable, thread-safe handle to one cell
#[derive(Debug, Clone)]
pub struct SharedFreewayCell {
    inner: Arc<Mutex<FreewayCell>>,
}

impl SharedFreewayCell {
    /// Wrap a cell
    pub fn new(cell: FreewayCell) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cell)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FreewayCell> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log_warn!("shared cell: recovering poisoned lock");
            poisoned.into_inner()
        })
    }

    /// Dispatch one event under the lock
    pub fn process_measurement(&self, event: &MeasurementEvent, upstream_merge_density: f64) -> Dispatch {
        self.lock().process_measurement(event, upstream_merge_density)
    }

    /// Current merge density
    pub fn merge_density(&self) -> f64 {
        self.lock().merge_density()
    }

    /// Run a read-only closure against the cell
    pub fn with_cell<R>(&self, f: impl FnOnce(&FreewayCell) -> R) -> R {
        f(&self.lock())
    }

    /// Copy of the current cell state
    pub fn snapshot(&self) -> FreewayCell {
        self.lock().clone()
    }
}

impl From<FreewayCell> for SharedFreewayCell {
    fn from(cell: FreewayCell) -> Self {
        Self::new(cell)
    }
}
