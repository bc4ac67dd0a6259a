//! Queue Coordinator: live per-department counters and wait estimates.
//!
//! A queue is keyed by `(department, queue_date)`, where the queue date
//! comes from the configured `RolloverPolicy`. `total` is owned by the
//! allocator; this module only moves `current`, one token at a time and
//! never past `total`.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::availability;
use crate::clinic_state::{ClinicError, ClinicState};
use crate::db;
use crate::models::{ClinicQueueSummary, Department, DoctorAvailability, QueueState};
use crate::scope_lock::ScopeKey;

/// Linear wait model: consultation minutes times outstanding tokens.
pub fn wait_minutes(consult_minutes: u32, current: u32, total: u32) -> u32 {
    consult_minutes.saturating_mul(total.saturating_sub(current))
}

pub(crate) fn snapshot_in(
    state: &ClinicState,
    conn: &Connection,
    department: Department,
    date: NaiveDate,
) -> Result<QueueState, ClinicError> {
    let queue_date = state.queue_date(date);
    let Some((current, total)) = db::get_queue_counters(conn, department, queue_date)? else {
        return Ok(QueueState::empty(department, queue_date));
    };
    let consult = state.consult_minutes(conn)?;

    Ok(QueueState {
        department,
        queue_date,
        current,
        total,
        wait_minutes: wait_minutes(consult, current, total),
    })
}

/// Latest committed counters for one queue. Queues nobody booked yet read as empty.
pub fn snapshot(
    state: &ClinicState,
    department: Department,
    date: NaiveDate,
) -> Result<QueueState, ClinicError> {
    state.read(|conn| snapshot_in(state, conn, department, date))
}

pub fn estimate_wait(
    state: &ClinicState,
    department: Department,
    date: NaiveDate,
) -> Result<u32, ClinicError> {
    Ok(snapshot(state, department, date)?.wait_minutes)
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    pub queue: QueueState,
    pub availability: Vec<DoctorAvailability>,
    /// `false` when `current` already equalled `total`.
    pub advanced: bool,
}

/// Serve the next token. Bounded by `total`, so advancing an exhausted
/// queue is a no-op rather than an error.
pub fn advance(
    state: &ClinicState,
    department: Department,
    date: NaiveDate,
) -> Result<AdvanceOutcome, ClinicError> {
    let queue_date = state.queue_date(date);
    let scope = ScopeKey::Queue {
        department,
        queue_date,
    };

    let outcome = state.write(&[scope], |tx| {
        let (current, total) = db::get_queue_counters(tx, department, queue_date)?.unwrap_or((0, 0));
        let advanced = current < total;
        if advanced {
            db::set_queue_current(tx, department, queue_date, current + 1)?;
        }

        let queue = snapshot_in(state, tx, department, date)?;
        let availability = availability::recompute_in(tx, &queue, state.config().busy_threshold)?;
        Ok(AdvanceOutcome {
            queue,
            availability,
            advanced,
        })
    })?;

    tracing::info!(
        department = %department,
        %queue_date,
        current = outcome.queue.current,
        total = outcome.queue.total,
        advanced = outcome.advanced,
        "Queue advanced"
    );
    Ok(outcome)
}

/// Counters summed over every department for `date`.
pub fn clinic_summary(state: &ClinicState, date: NaiveDate) -> Result<ClinicQueueSummary, ClinicError> {
    state.read(|conn| {
        let queue_date = state.queue_date(date);
        let consult = state.consult_minutes(conn)?;

        let (mut current, mut total, mut outstanding) = (0u32, 0u32, 0u32);
        for (_, c, t) in db::list_queue_counters(conn, queue_date)? {
            current = current.saturating_add(c);
            total = total.saturating_add(t);
            outstanding = outstanding.saturating_add(t.saturating_sub(c));
        }

        Ok(ClinicQueueSummary {
            date,
            current,
            total,
            wait_minutes: consult.saturating_mul(outstanding),
        })
    })
}
