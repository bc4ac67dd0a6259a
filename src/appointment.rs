//! Appointment Store: booking, lookup and the status state machine.
//!
//! A booking runs as one transaction under the lock of its department
//! queue: idempotence check, bookability check, id + token allocation,
//! insert, then availability recompute. A second `Scheduled` booking for
//! the same (mobile, department, date) returns the existing record and
//! consumes no token.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;

use crate::allocator;
use crate::availability;
use crate::clinic_state::{ClinicError, ClinicState};
use crate::db;
use crate::models::*;
use crate::queue;
use crate::scope_lock::ScopeKey;

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

pub const MAX_PATIENT_AGE: i64 = 150;
pub const MAX_NAME_CHARS: usize = 100;

// ═══════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════

/// Patient mobile numbers are exactly ten ASCII digits.
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

pub fn parse_department(value: &str) -> Result<Department, ClinicError> {
    Department::from_str(value.trim())
        .map_err(|_| ClinicError::Validation(format!("Unknown department: {value}")))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ClinicError::Validation(format!("Invalid date (expected YYYY-MM-DD): {value}")))
}

/// Check a raw booking request before anything is allocated.
pub fn validate_booking(req: &BookingRequest) -> Result<ValidBooking, ClinicError> {
    let department = parse_department(&req.department)?;
    let date = parse_date(&req.date)?;

    let mobile = req.patient_mobile.trim();
    if !is_valid_mobile(mobile) {
        return Err(ClinicError::Validation(
            "Mobile number must be exactly 10 digits".into(),
        ));
    }

    let name = req.patient_name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(ClinicError::Validation(format!(
            "Patient name must be 1-{MAX_NAME_CHARS} characters"
        )));
    }

    if !(0..=MAX_PATIENT_AGE).contains(&req.patient_age) {
        return Err(ClinicError::Validation(format!(
            "Patient age must be between 0 and {MAX_PATIENT_AGE}"
        )));
    }

    Ok(ValidBooking {
        department,
        date,
        patient_mobile: mobile.to_string(),
        patient_name: name.to_string(),
        patient_age: req.patient_age as u32,
    })
}

// ═══════════════════════════════════════════════════════════
// Booking
// ═══════════════════════════════════════════════════════════

/// Everything a booking commits, read back inside the same transaction.
#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub outcome: BookingOutcome,
    pub queue: QueueState,
    pub availability: Vec<DoctorAvailability>,
}

pub fn create(state: &ClinicState, req: &BookingRequest) -> Result<BookingReceipt, ClinicError> {
    let booking = validate_booking(req)?;
    let queue_date = state.queue_date(booking.date);
    let scope = ScopeKey::Queue {
        department: booking.department,
        queue_date,
    };

    let receipt = state.write(&[scope], |tx| {
        let existing = db::find_active_booking(
            tx,
            &booking.patient_mobile,
            booking.department,
            booking.date,
        )?;

        let outcome = match existing {
            Some(apt) => BookingOutcome::Existing(apt),
            None => {
                if !availability::is_bookable_in(tx, booking.department)? {
                    return Err(ClinicError::DepartmentUnavailable(booking.department));
                }

                let apt = Appointment {
                    id: allocator::allocate_appointment_id(tx)?,
                    queue_token: allocator::allocate_token(tx, booking.department, queue_date)?,
                    patient_mobile: booking.patient_mobile.clone(),
                    patient_name: booking.patient_name.clone(),
                    patient_age: booking.patient_age,
                    department: booking.department,
                    date: booking.date,
                    status: AppointmentStatus::Scheduled,
                    follow_up_date: None,
                };
                db::insert_appointment(tx, &apt, queue_date)?;
                BookingOutcome::Created(apt)
            }
        };

        let queue = queue::snapshot_in(state, tx, booking.department, booking.date)?;
        let availability =
            availability::recompute_in(tx, &queue, state.config().busy_threshold)?;

        Ok(BookingReceipt {
            outcome,
            queue,
            availability,
        })
    })?;

    let apt = receipt.outcome.appointment();
    if receipt.outcome.is_idempotent() {
        tracing::info!(appointment_id = apt.id, token = apt.queue_token, department = %apt.department, "Booking already exists, returning it");
    } else {
        tracing::info!(appointment_id = apt.id, token = apt.queue_token, department = %apt.department, date = %apt.date, "Appointment booked");
    }
    Ok(receipt)
}

// ═══════════════════════════════════════════════════════════
// Lookup
// ═══════════════════════════════════════════════════════════

pub fn get(state: &ClinicState, id: AppointmentId) -> Result<Appointment, ClinicError> {
    state.read(|conn| get_in(conn, id))
}

pub(crate) fn get_in(conn: &Connection, id: AppointmentId) -> Result<Appointment, ClinicError> {
    db::get_appointment(conn, id)?.ok_or(ClinicError::AppointmentNotFound(id))
}

/// A patient's appointments, newest first. Empty for an unknown mobile.
pub fn get_by_mobile(state: &ClinicState, mobile: &str) -> Result<Vec<Appointment>, ClinicError> {
    state.read(|conn| Ok(db::list_appointments_by_mobile(conn, mobile.trim())?))
}

/// Every appointment, newest first (doctor desk).
pub fn list_all(state: &ClinicState) -> Result<Vec<Appointment>, ClinicError> {
    state.read(|conn| Ok(db::list_all_appointments(conn)?))
}

/// A patient's appointments with their report summaries, newest first.
pub fn patient_history(
    state: &ClinicState,
    mobile: &str,
) -> Result<Vec<PatientHistoryEntry>, ClinicError> {
    let mobile = mobile.trim();
    if !is_valid_mobile(mobile) {
        return Err(ClinicError::Validation(
            "Mobile number must be exactly 10 digits".into(),
        ));
    }
    state.read(|conn| Ok(db::get_patient_history(conn, mobile)?))
}

// ═══════════════════════════════════════════════════════════
// Status transitions
// ═══════════════════════════════════════════════════════════

/// Apply one status change inside an open transaction.
pub(crate) fn transition_in(
    conn: &Connection,
    id: AppointmentId,
    next: AppointmentStatus,
) -> Result<Appointment, ClinicError> {
    let mut apt = get_in(conn, id)?;
    if !apt.status.can_transition_to(next) {
        tracing::warn!(appointment_id = id, from = %apt.status, to = %next, "Rejected status transition");
        return Err(ClinicError::InvalidTransition {
            id,
            from: apt.status,
            to: next,
        });
    }
    db::update_appointment_status(conn, id, next)?;
    apt.status = next;
    Ok(apt)
}

/// Result of a status change, with the department's recomputed availability.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub appointment: Appointment,
    pub availability: Vec<DoctorAvailability>,
}

/// Move an appointment along the state machine.
///
/// `Scheduled -> Completed` is normally reached through report attachment,
/// which carries the report in the same transaction.
pub fn transition(
    state: &ClinicState,
    id: AppointmentId,
    next: AppointmentStatus,
) -> Result<TransitionOutcome, ClinicError> {
    let outcome = state.write(&[ScopeKey::Appointment(id)], |tx| {
        let appointment = transition_in(tx, id, next)?;
        let queue = queue::snapshot_in(state, tx, appointment.department, appointment.date)?;
        let availability =
            availability::recompute_in(tx, &queue, state.config().busy_threshold)?;
        Ok(TransitionOutcome {
            appointment,
            availability,
        })
    })?;

    tracing::info!(appointment_id = id, status = %next, "Appointment status changed");
    Ok(outcome)
}

/// Explicit cancellation. The token stays counted in the queue total.
pub fn cancel(state: &ClinicState, id: AppointmentId) -> Result<TransitionOutcome, ClinicError> {
    transition(state, id, AppointmentStatus::Cancelled)
}
