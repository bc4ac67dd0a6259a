use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, patient_mobile, patient_name, patient_age, department,
     date, status, queue_token, follow_up_date";

pub fn insert_appointment(
    conn: &Connection,
    apt: &Appointment,
    queue_date: NaiveDate,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_mobile, patient_name, patient_age, department,
         date, queue_date, status, queue_token, follow_up_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            apt.id,
            apt.patient_mobile,
            apt.patient_name,
            apt.patient_age,
            apt.department.as_str(),
            apt.date,
            queue_date,
            apt.status.as_str(),
            apt.queue_token,
            apt.follow_up_date,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: AppointmentId,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            appointment_row_from_rusqlite,
        )
        .optional()?;

    row.map(appointment_from_row).transpose()
}

/// The live (`Scheduled`) booking for a patient in a department on a date, if any.
pub fn find_active_booking(
    conn: &Connection,
    mobile: &str,
    department: Department,
    date: NaiveDate,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                 WHERE patient_mobile = ?1 AND department = ?2 AND date = ?3
                   AND status = 'Scheduled'"
            ),
            params![mobile, department.as_str(), date],
            appointment_row_from_rusqlite,
        )
        .optional()?;

    row.map(appointment_from_row).transpose()
}

/// All appointments for a patient, newest first.
pub fn list_appointments_by_mobile(
    conn: &Connection,
    mobile: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_mobile = ?1
         ORDER BY date DESC, id DESC"
    ))?;

    let rows = stmt.query_map(params![mobile], appointment_row_from_rusqlite)?;
    collect_appointments(rows)
}

/// Every appointment in the clinic, newest first.
pub fn list_all_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], appointment_row_from_rusqlite)?;
    collect_appointments(rows)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: AppointmentId,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_appointment_follow_up(
    conn: &Connection,
    id: AppointmentId,
    follow_up_date: NaiveDate,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE appointments SET follow_up_date = ?1 WHERE id = ?2",
        params![follow_up_date, id],
    )?;
    Ok(())
}

/// Appointments for a patient joined with their report summary, newest first.
pub fn get_patient_history(
    conn: &Connection,
    mobile: &str,
) -> Result<Vec<PatientHistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_mobile, a.patient_name, a.patient_age, a.department,
                a.date, a.status, a.queue_token, a.follow_up_date,
                r.diagnosis, r.medicines, r.symptoms
         FROM appointments a
         LEFT JOIN reports r ON r.appointment_id = a.id
         WHERE a.patient_mobile = ?1
         ORDER BY a.date DESC, a.id DESC",
    )?;

    let rows = stmt.query_map(params![mobile], |row| {
        Ok((
            appointment_row_from_rusqlite(row)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, Option<String>>(10)?,
            row.get::<_, Option<String>>(11)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (apt, diagnosis, medicines, symptoms) = row?;
        entries.push(PatientHistoryEntry {
            appointment: appointment_from_row(apt)?,
            diagnosis,
            medicines,
            symptoms,
        });
    }
    Ok(entries)
}

// ─── Row mapping ─────────────────────────────────────────────────────────────

struct AppointmentRow {
    id: i64,
    patient_mobile: String,
    patient_name: String,
    patient_age: u32,
    department: String,
    date: NaiveDate,
    status: String,
    queue_token: u32,
    follow_up_date: Option<NaiveDate>,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_mobile: row.get(1)?,
        patient_name: row.get(2)?,
        patient_age: row.get(3)?,
        department: row.get(4)?,
        date: row.get(5)?,
        status: row.get(6)?,
        queue_token: row.get(7)?,
        follow_up_date: row.get(8)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        patient_mobile: row.patient_mobile,
        patient_name: row.patient_name,
        patient_age: row.patient_age,
        department: Department::from_str(&row.department)?,
        date: row.date,
        status: AppointmentStatus::from_str(&row.status)?,
        queue_token: row.queue_token,
        follow_up_date: row.follow_up_date,
    })
}

fn collect_appointments<I>(rows: I) -> Result<Vec<Appointment>, DatabaseError>
where
    I: Iterator<Item = Result<AppointmentRow, rusqlite::Error>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(appointment_from_row(row?)?);
    }
    Ok(out)
}
