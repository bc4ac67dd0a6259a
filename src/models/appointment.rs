use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentStatus, Department};

pub type AppointmentId = i64;
pub type Token = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_mobile: String,
    pub patient_name: String,
    pub patient_age: u32,
    pub department: Department,
    pub date: NaiveDate,
    pub status: AppointmentStatus,
    pub queue_token: Token,
    pub follow_up_date: Option<NaiveDate>,
}

/// Raw booking request as received from a client.
///
/// Accepts the short field names (`dept`, `mobile`) older clients send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(alias = "dept")]
    pub department: String,
    pub date: String, // YYYY-MM-DD
    #[serde(alias = "mobile")]
    pub patient_mobile: String,
    pub patient_name: String,
    pub patient_age: i64,
}

/// Booking request after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub department: Department,
    pub date: NaiveDate,
    pub patient_mobile: String,
    pub patient_name: String,
    pub patient_age: u32,
}

/// Outcome of a booking: either a freshly minted appointment or the
/// existing scheduled one for the same patient, department and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Created(Appointment),
    Existing(Appointment),
}

impl BookingOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            BookingOutcome::Created(a) | BookingOutcome::Existing(a) => a,
        }
    }

    pub fn into_appointment(self) -> Appointment {
        match self {
            BookingOutcome::Created(a) | BookingOutcome::Existing(a) => a,
        }
    }

    pub fn is_idempotent(&self) -> bool {
        matches!(self, BookingOutcome::Existing(_))
    }
}

/// Appointment joined with its report summary, for the doctor's history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientHistoryEntry {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub diagnosis: Option<String>,
    pub medicines: Option<String>,
    pub symptoms: Option<String>,
}
