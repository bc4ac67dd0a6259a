//! Identity allocation: appointment ids and per-queue tokens.
//!
//! Both allocators take the caller's open `Transaction`, so an id or token
//! only becomes visible together with the record that uses it. Appointment
//! ids come from one global counter; tokens from the `total` column of the
//! queue they belong to.

use chrono::NaiveDate;
use rusqlite::Transaction;

use crate::clinic_state::ClinicError;
use crate::db;
use crate::models::{AppointmentId, Department, Token};

const APPOINTMENT_SEQUENCE: &str = "appointment";

/// Next appointment id. Strictly increasing, never reused (a rolled-back
/// transaction also rolls back the counter, so there are no gaps either).
pub fn allocate_appointment_id(tx: &Transaction<'_>) -> Result<AppointmentId, ClinicError> {
    Ok(db::next_sequence_value(tx, APPOINTMENT_SEQUENCE)?)
}

/// Next token for the queue `(department, queue_date)`, creating it lazily.
pub fn allocate_token(
    tx: &Transaction<'_>,
    department: Department,
    queue_date: NaiveDate,
) -> Result<Token, ClinicError> {
    Ok(db::increment_queue_total(tx, department, queue_date)?)
}
