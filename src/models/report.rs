use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::appointment::AppointmentId;

/// Consultation record that terminates an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub appointment_id: AppointmentId,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub medicines: String,
    pub notes: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: String,
}

/// Fields a doctor submits for a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFields {
    pub diagnosis: String,
    #[serde(default)]
    pub symptoms: Option<String>,
    pub medicines: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub follow_up_date: Option<String>, // YYYY-MM-DD
}

/// Report fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub medicines: String,
    pub notes: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}
