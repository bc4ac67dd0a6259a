use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, name, department, room_number, description, off_duty";

pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id"))?;
    let rows = stmt.query_map([], doctor_row_from_rusqlite)?;
    collect_doctors(rows)
}

pub fn get_doctors_in_department(
    conn: &Connection,
    department: Department,
) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE department = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![department.as_str()], doctor_row_from_rusqlite)?;
    collect_doctors(rows)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            params![id],
            doctor_row_from_rusqlite,
        )
        .optional()?;
    row.map(doctor_from_row).transpose()
}

/// Set or clear the operator's off-duty override.
pub fn set_doctor_off_duty(conn: &Connection, id: i64, off_duty: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET off_duty = ?1 WHERE id = ?2",
        params![off_duty, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct DoctorRow {
    id: i64,
    name: String,
    department: String,
    room_number: Option<String>,
    description: Option<String>,
    off_duty: bool,
}

fn doctor_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoctorRow, rusqlite::Error> {
    Ok(DoctorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        room_number: row.get(3)?,
        description: row.get(4)?,
        off_duty: row.get(5)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: row.id,
        name: row.name,
        department: Department::from_str(&row.department)?,
        room_number: row.room_number,
        description: row.description,
        off_duty: row.off_duty,
    })
}

fn collect_doctors<I>(rows: I) -> Result<Vec<Doctor>, DatabaseError>
where
    I: Iterator<Item = Result<DoctorRow, rusqlite::Error>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(doctor_from_row(row?)?);
    }
    Ok(out)
}
