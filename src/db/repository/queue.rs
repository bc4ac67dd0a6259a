use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

/// Raw counters for a queue, `None` until the first booking creates the row.
pub fn get_queue_counters(
    conn: &Connection,
    department: Department,
    queue_date: NaiveDate,
) -> Result<Option<(u32, u32)>, DatabaseError> {
    let counters = conn
        .query_row(
            "SELECT current, total FROM queue_state WHERE department = ?1 AND queue_date = ?2",
            params![department.as_str(), queue_date],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(counters)
}

/// Increment `total` for a queue, creating the row lazily. Returns the new total.
pub fn increment_queue_total(
    conn: &Connection,
    department: Department,
    queue_date: NaiveDate,
) -> Result<u32, DatabaseError> {
    conn.execute(
        "INSERT INTO queue_state (department, queue_date, current, total)
         VALUES (?1, ?2, 0, 1)
         ON CONFLICT (department, queue_date)
         DO UPDATE SET total = total + 1, updated_at = datetime('now')",
        params![department.as_str(), queue_date],
    )?;

    let total = conn.query_row(
        "SELECT total FROM queue_state WHERE department = ?1 AND queue_date = ?2",
        params![department.as_str(), queue_date],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn set_queue_current(
    conn: &Connection,
    department: Department,
    queue_date: NaiveDate,
    current: u32,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE queue_state SET current = ?1, updated_at = datetime('now')
         WHERE department = ?2 AND queue_date = ?3",
        params![current, department.as_str(), queue_date],
    )?;
    Ok(())
}

/// Counters of every queue kept under `queue_date`, keyed by department.
pub fn list_queue_counters(
    conn: &Connection,
    queue_date: NaiveDate,
) -> Result<Vec<(Department, u32, u32)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT department, current, total FROM queue_state
         WHERE queue_date = ?1 ORDER BY department",
    )?;

    let rows = stmt.query_map(params![queue_date], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, u32>(2)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (department, current, total) = row?;
        out.push((Department::from_str(&department)?, current, total));
    }
    Ok(out)
}
