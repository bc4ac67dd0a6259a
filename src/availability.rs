//! Availability Tracker.
//!
//! Doctor status is never stored. It is derived from the department queue
//! plus the operator's off-duty override every time something that could
//! change it commits (booking, cancel, advance, report), and on every read
//! of the doctor roster.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::clinic_state::{ClinicError, ClinicState};
use crate::db;
use crate::models::{Department, Doctor, DoctorAvailability, DoctorStatus, DoctorView, QueueState};
use crate::queue;

/// Resolve one doctor's status.
///
/// The override always wins. Otherwise a doctor is `Busy` once more than
/// `busy_threshold` consultations are outstanding in their queue. `Busy`
/// still accepts bookings; only `Off` blocks them.
pub fn derive_status(off_duty: bool, outstanding: u32, busy_threshold: u32) -> DoctorStatus {
    if off_duty {
        DoctorStatus::Off
    } else if outstanding > busy_threshold {
        DoctorStatus::Busy
    } else {
        DoctorStatus::Available
    }
}

/// Availability of every doctor in `queue.department`, given its live counters.
pub(crate) fn recompute_in(
    conn: &Connection,
    queue: &QueueState,
    busy_threshold: u32,
) -> Result<Vec<DoctorAvailability>, ClinicError> {
    let doctors = db::get_doctors_in_department(conn, queue.department)?;
    let availability: Vec<DoctorAvailability> = doctors
        .iter()
        .map(|d| DoctorAvailability {
            doctor_id: d.id,
            department: d.department,
            status: derive_status(d.off_duty, queue.outstanding(), busy_threshold),
        })
        .collect();

    tracing::debug!(
        department = %queue.department,
        outstanding = queue.outstanding(),
        doctors = availability.len(),
        "Availability recomputed"
    );
    Ok(availability)
}

/// Current availability of the doctors in `department` for `date`.
pub fn recompute(
    state: &ClinicState,
    department: Department,
    date: NaiveDate,
) -> Result<Vec<DoctorAvailability>, ClinicError> {
    state.read(|conn| {
        let queue = queue::snapshot_in(state, conn, department, date)?;
        recompute_in(conn, &queue, state.config().busy_threshold)
    })
}

pub(crate) fn is_bookable_in(conn: &Connection, department: Department) -> Result<bool, ClinicError> {
    let doctors = db::get_doctors_in_department(conn, department)?;
    Ok(doctors.iter().any(|d| !d.off_duty))
}

/// Whether `department` accepts new bookings: at least one doctor is not `Off`.
pub fn is_bookable(state: &ClinicState, department: Department) -> Result<bool, ClinicError> {
    state.read(|conn| is_bookable_in(conn, department))
}

/// Set or clear the operator override for one doctor.
pub fn set_off_duty(state: &ClinicState, doctor_id: i64, off_duty: bool) -> Result<Doctor, ClinicError> {
    let doctor = state.write(&[], |tx| {
        if db::get_doctor(tx, doctor_id)?.is_none() {
            return Err(ClinicError::NotFound(format!("Doctor {doctor_id}")));
        }
        db::set_doctor_off_duty(tx, doctor_id, off_duty)?;
        db::get_doctor(tx, doctor_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("Doctor {doctor_id}")))
    })?;

    tracing::info!(doctor_id, off_duty, department = %doctor.department, "Doctor override updated");
    Ok(doctor)
}

/// Roster projection for the booking screen: each doctor with derived
/// status and their department's counters on `date`.
pub fn doctor_views(state: &ClinicState, date: NaiveDate) -> Result<Vec<DoctorView>, ClinicError> {
    state.read(|conn| {
        let threshold = state.config().busy_threshold;
        let mut views = Vec::new();
        for doctor in db::get_all_doctors(conn)? {
            let queue = queue::snapshot_in(state, conn, doctor.department, date)?;
            views.push(DoctorView {
                status: derive_status(doctor.off_duty, queue.outstanding(), threshold),
                id: doctor.id,
                name: doctor.name,
                department: doctor.department,
                room_number: doctor.room_number,
                description: doctor.description,
                queue_current: queue.current,
                queue_total: queue.total,
                wait_minutes: queue.wait_minutes,
            });
        }
        Ok(views)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinic_state::test_support::*;

    fn cardiology_doctor(state: &ClinicState) -> Doctor {
        state
            .read(|conn| Ok(db::get_doctors_in_department(conn, Department::Cardiology)?))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn derive_status_policy() {
        assert_eq!(derive_status(false, 0, 0), DoctorStatus::Available);
        assert_eq!(derive_status(false, 1, 0), DoctorStatus::Busy);
        assert_eq!(derive_status(false, 2, 2), DoctorStatus::Available);
        assert_eq!(derive_status(false, 3, 2), DoctorStatus::Busy);
        assert_eq!(derive_status(true, 0, 0), DoctorStatus::Off);
        assert_eq!(derive_status(true, 9, 0), DoctorStatus::Off);
    }

    #[test]
    fn empty_queue_is_available() {
        let (state, _tmp) = test_state();
        let availability = recompute(&state, Department::Cardiology, day(1)).unwrap();
        assert!(!availability.is_empty());
        assert!(availability.iter().all(|a| a.status == DoctorStatus::Available));
    }

    #[test]
    fn off_duty_override_blocks_booking() {
        let (state, _tmp) = test_state();
        let doctor = cardiology_doctor(&state);
        assert!(is_bookable(&state, Department::Cardiology).unwrap());

        let updated = set_off_duty(&state, doctor.id, true).unwrap();
        assert!(updated.off_duty);
        assert!(!is_bookable(&state, Department::Cardiology).unwrap());

        let availability = recompute(&state, Department::Cardiology, day(1)).unwrap();
        let entry = availability.iter().find(|a| a.doctor_id == doctor.id).unwrap();
        assert_eq!(entry.status, DoctorStatus::Off);

        set_off_duty(&state, doctor.id, false).unwrap();
        assert!(is_bookable(&state, Department::Cardiology).unwrap());
    }

    #[test]
    fn unknown_doctor_is_not_found() {
        let (state, _tmp) = test_state();
        let err = set_off_duty(&state, 9_999, true).unwrap_err();
        assert!(matches!(err, ClinicError::NotFound(_)));
    }

    #[test]
    fn doctor_views_cover_the_roster() {
        let (state, _tmp) = test_state();
        let views = doctor_views(&state, day(1)).unwrap();
        let roster = state.read(|conn| Ok(db::get_all_doctors(conn)?)).unwrap();
        assert_eq!(views.len(), roster.len());
        assert!(views.iter().all(|v| v.queue_total == 0 && v.wait_minutes == 0));
    }
}
