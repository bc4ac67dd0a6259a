//! Per-scope write serialization.
//!
//! Writers name the scopes they touch (a department queue on a date, or a
//! single appointment) and hold them for the length of one transaction.
//! Unrelated scopes never wait on each other at this layer. A writer that
//! cannot get its scopes within the retry budget gets
//! `ClinicError::TemporarilyUnavailable` instead of blocking forever.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::clinic_state::ClinicError;
use crate::models::{AppointmentId, Department};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Token allocation and advancement for one department queue.
    Queue {
        department: Department,
        queue_date: NaiveDate,
    },
    /// Status changes and report attachment for one appointment.
    Appointment(AppointmentId),
}

pub struct ScopeLocks {
    held: Mutex<HashSet<ScopeKey>>,
    released: Condvar,
    budget: Duration,
}

/// Releases its scopes on drop.
#[must_use = "scopes are released as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    locks: &'a ScopeLocks,
    keys: Vec<ScopeKey>,
}

impl ScopeLocks {
    pub fn new(budget: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            budget,
        }
    }

    /// Take every scope in `keys` at once, waiting up to the retry budget.
    ///
    /// All-or-nothing acquisition means two writers can never each hold
    /// half of what the other needs.
    pub fn acquire(&self, keys: &[ScopeKey]) -> Result<ScopeGuard<'_>, ClinicError> {
        let deadline = Instant::now() + self.budget;
        let mut held = self.held.lock().map_err(|_| ClinicError::LockPoisoned)?;

        loop {
            if keys.iter().all(|k| !held.contains(k)) {
                held.extend(keys.iter().copied());
                return Ok(ScopeGuard {
                    locks: self,
                    keys: keys.to_vec(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(?keys, budget_ms = self.budget.as_millis() as u64, "Scope lock budget exhausted");
                return Err(ClinicError::TemporarilyUnavailable(
                    "another request is updating the same queue or appointment".into(),
                ));
            }

            let (guard, _timeout) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| ClinicError::LockPoisoned)?;
            held = guard;
        }
    }

    /// Number of scopes currently held (diagnostics).
    pub fn held_count(&self) -> usize {
        self.held.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let mut held = match self.locks.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
