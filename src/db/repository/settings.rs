use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

/// Key of the per-consultation minutes override.
pub const WAIT_TIME_KEY: &str = "wait_time";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let value = conn
        .query_row(
            "SELECT value FROM system_settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO system_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Advance a named counter in `id_sequences` and return its new value.
pub fn next_sequence_value(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    let changed = conn.execute(
        "UPDATE id_sequences SET value = value + 1 WHERE name = ?1",
        params![name],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Sequence".into(),
            id: name.to_string(),
        });
    }
    let value = conn.query_row(
        "SELECT value FROM id_sequences WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(value)
}
