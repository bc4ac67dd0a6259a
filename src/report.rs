//! Report Attachment: the consultation record that completes an appointment.
//!
//! Inserting the report, moving the appointment to `Completed` and copying
//! the follow-up date happen in one transaction under the appointment's
//! scope lock. A concurrent reader sees either none of it or all of it.

use serde::Serialize;

use crate::appointment;
use crate::availability;
use crate::clinic_state::{ClinicError, ClinicState};
use crate::db;
use crate::models::*;
use crate::queue;
use crate::scope_lock::ScopeKey;

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_report(fields: &ReportFields) -> Result<NewReport, ClinicError> {
    let diagnosis = fields.diagnosis.trim();
    if diagnosis.is_empty() {
        return Err(ClinicError::Validation("diagnosis is required".into()));
    }
    let medicines = fields.medicines.trim();
    if medicines.is_empty() {
        return Err(ClinicError::Validation("medicines is required".into()));
    }

    let follow_up_date = match non_empty(fields.follow_up_date.as_deref()) {
        Some(raw) => Some(appointment::parse_date(&raw)?),
        None => None,
    };

    Ok(NewReport {
        diagnosis: diagnosis.to_string(),
        symptoms: non_empty(fields.symptoms.as_deref()),
        medicines: medicines.to_string(),
        notes: non_empty(fields.notes.as_deref()),
        follow_up_date,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachedReport {
    pub report: Report,
    pub appointment: Appointment,
    pub availability: Vec<DoctorAvailability>,
}

pub fn attach(
    state: &ClinicState,
    appointment_id: AppointmentId,
    fields: &ReportFields,
) -> Result<AttachedReport, ClinicError> {
    let new_report = validate_report(fields)?;

    let attached = state.write(&[ScopeKey::Appointment(appointment_id)], |tx| {
        let current = appointment::get_in(tx, appointment_id)?;
        if current.status != AppointmentStatus::Scheduled {
            return Err(ClinicError::AlreadyFinalized {
                id: appointment_id,
                status: current.status,
            });
        }

        let report = db::insert_report(tx, appointment_id, &new_report)?;
        let mut appointment =
            appointment::transition_in(tx, appointment_id, AppointmentStatus::Completed)?;
        if let Some(follow_up) = new_report.follow_up_date {
            db::set_appointment_follow_up(tx, appointment_id, follow_up)?;
            appointment.follow_up_date = Some(follow_up);
        }

        let queue = queue::snapshot_in(state, tx, appointment.department, appointment.date)?;
        let availability =
            availability::recompute_in(tx, &queue, state.config().busy_threshold)?;

        Ok(AttachedReport {
            report,
            appointment,
            availability,
        })
    });

    match &attached {
        Ok(a) => tracing::info!(
            appointment_id,
            report_id = a.report.id,
            follow_up = a.appointment.follow_up_date.is_some(),
            "Report attached"
        ),
        Err(ClinicError::AlreadyFinalized { status, .. }) => {
            tracing::warn!(appointment_id, %status, "Report rejected: appointment already finalized")
        }
        Err(_) => {}
    }
    attached
}

pub fn get_report(state: &ClinicState, appointment_id: AppointmentId) -> Result<Report, ClinicError> {
    state.read(|conn| {
        db::get_report_by_appointment(conn, appointment_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("Report for appointment {appointment_id}")))
    })
}
