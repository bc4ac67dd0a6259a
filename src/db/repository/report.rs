use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

/// Insert a report and return it with its assigned id and timestamp.
pub fn insert_report(
    conn: &Connection,
    appointment_id: AppointmentId,
    fields: &NewReport,
) -> Result<Report, DatabaseError> {
    conn.execute(
        "INSERT INTO reports (appointment_id, diagnosis, symptoms, medicines, notes, follow_up_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            appointment_id,
            fields.diagnosis,
            fields.symptoms,
            fields.medicines,
            fields.notes,
            fields.follow_up_date,
        ],
    )?;

    get_report_by_appointment(conn, appointment_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Report".into(),
        id: appointment_id.to_string(),
    })
}

pub fn get_report_by_appointment(
    conn: &Connection,
    appointment_id: AppointmentId,
) -> Result<Option<Report>, DatabaseError> {
    let report = conn
        .query_row(
            "SELECT id, appointment_id, diagnosis, symptoms, medicines, notes, follow_up_date, created_at
             FROM reports WHERE appointment_id = ?1",
            params![appointment_id],
            |row| {
                Ok(Report {
                    id: row.get(0)?,
                    appointment_id: row.get(1)?,
                    diagnosis: row.get(2)?,
                    symptoms: row.get(3)?,
                    medicines: row.get(4)?,
                    notes: row.get(5)?,
                    follow_up_date: row.get(6)?,
                    created_at: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(report)
}

pub fn count_reports(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
    Ok(count)
}
