//! Shared clinic engine state.
//!
//! `ClinicState` is created once at startup and wrapped in `Arc` so every
//! request handler works against the same database location, configuration
//! and scope locks. Each operation opens its own SQLite connection; writes run
//! inside a single `BEGIN IMMEDIATE` transaction while holding their scope
//! locks, so a request either commits everything or nothing.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::{ClinicConfig, ConfigError};
use crate::db::{self, DatabaseError};
use crate::models::{AppointmentId, AppointmentStatus, Department};
use crate::scope_lock::{ScopeKey, ScopeLocks};

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Domain errors surfaced to callers with a stable reason code.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("No doctor in {0} is taking bookings")]
    DepartmentUnavailable(Department),
    #[error("Appointment {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: AppointmentId,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("Appointment {id} is already {status}")]
    AlreadyFinalized {
        id: AppointmentId,
        status: AppointmentStatus,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Appointment {0} not found")]
    AppointmentNotFound(AppointmentId),
    #[error("No appointments found for patient {0}")]
    PatientNotFound(String),
    #[error("Invalid check-in payload: {0}")]
    InvalidCheckin(String),
    #[error("Temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClinicError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ClinicError::Validation(_) => "VALIDATION_ERROR",
            ClinicError::DepartmentUnavailable(_) => "DEPARTMENT_UNAVAILABLE",
            ClinicError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ClinicError::AlreadyFinalized { .. } => "ALREADY_FINALIZED",
            ClinicError::NotFound(_) => "NOT_FOUND",
            ClinicError::AppointmentNotFound(_) => "APPOINTMENT_NOT_FOUND",
            ClinicError::PatientNotFound(_) => "PATIENT_NOT_FOUND",
            ClinicError::InvalidCheckin(_) => "INVALID_CHECKIN",
            ClinicError::TemporarilyUnavailable(_) => "TEMPORARILY_UNAVAILABLE",
            ClinicError::LockPoisoned
            | ClinicError::Database(_)
            | ClinicError::Config(_)
            | ClinicError::Io(_) => "INTERNAL",
        }
    }

    /// Whether the same request may succeed if sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClinicError::TemporarilyUnavailable(_))
    }
}

impl From<DatabaseError> for ClinicError {
    fn from(err: DatabaseError) -> Self {
        if err.is_busy() {
            ClinicError::TemporarilyUnavailable("database is busy".into())
        } else {
            ClinicError::Database(err)
        }
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

// ═══════════════════════════════════════════════════════════
// ClinicState
// ═══════════════════════════════════════════════════════════

pub struct ClinicState {
    config: ClinicConfig,
    locks: ScopeLocks,
}

impl ClinicState {
    /// Create the database (and its directory) if needed and bring the schema up to date.
    pub fn open(config: ClinicConfig) -> Result<Self, ClinicError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = db::open_database(&config.db_path, config.lock_budget())?;
        drop(conn);

        tracing::info!(db = %config.db_path.display(), rollover = ?config.rollover, "Clinic database ready");

        Ok(Self {
            locks: ScopeLocks::new(config.lock_budget()),
            config,
        })
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    pub fn locks(&self) -> &ScopeLocks {
        &self.locks
    }

    /// Open a connection to the clinic database.
    pub fn open_db(&self) -> Result<Connection, ClinicError> {
        Ok(db::connect(&self.config.db_path, self.config.lock_budget())?)
    }

    /// Run a read-only operation on a fresh connection.
    pub fn read<T, F>(&self, op: F) -> Result<T, ClinicError>
    where
        F: FnOnce(&Connection) -> Result<T, ClinicError>,
    {
        let conn = self.open_db()?;
        op(&conn)
    }

    /// Run a mutation as one atomic unit while holding `scopes`.
    ///
    /// The transaction rolls back if `op` fails, so no partial write is
    /// ever visible to concurrent readers.
    pub fn write<T, F>(&self, scopes: &[ScopeKey], op: F) -> Result<T, ClinicError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, ClinicError>,
    {
        let _guard = self.locks.acquire(scopes)?;
        let mut conn = self.open_db()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Minutes per consultation: the `wait_time` setting when present, else config.
    pub fn consult_minutes(&self, conn: &Connection) -> Result<u32, ClinicError> {
        let setting = db::get_setting(conn, db::WAIT_TIME_KEY)?;
        Ok(setting
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(self.config.consult_minutes))
    }

    /// Change the per-consultation minutes used for wait estimates.
    pub fn set_consult_minutes(&self, minutes: u32) -> Result<(), ClinicError> {
        if minutes == 0 || minutes > 240 {
            return Err(ClinicError::Validation(
                "wait_time must be between 1 and 240 minutes".into(),
            ));
        }
        let conn = self.open_db()?;
        db::set_setting(&conn, db::WAIT_TIME_KEY, &minutes.to_string())?;
        tracing::info!(minutes, "Consultation duration updated");
        Ok(())
    }

    /// Queue key date for an appointment date under the configured rollover policy.
    pub fn queue_date(&self, date: NaiveDate) -> NaiveDate {
        self.config.rollover.queue_date(date)
    }

    /// Today's local date, used when a caller does not name one.
    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;

    /// A clinic backed by a fresh on-disk database. Keep the `TempDir` alive.
    pub fn test_state_with(
        tweak: impl FnOnce(&mut ClinicConfig),
    ) -> (Arc<ClinicState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = ClinicConfig {
            db_path: tmp.path().join("clinic.db"),
            ..ClinicConfig::default()
        };
        tweak(&mut config);
        (Arc::new(ClinicState::open(config).unwrap()), tmp)
    }

    pub fn test_state() -> (Arc<ClinicState>, tempfile::TempDir) {
        test_state_with(|_| {})
    }

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    pub fn booking(department: &str, date: &str, mobile: &str) -> crate::models::BookingRequest {
        crate::models::BookingRequest {
            department: department.into(),
            date: date.into(),
            patient_mobile: mobile.into(),
            patient_name: "Asha Rao".into(),
            patient_age: 34,
        }
    }
}
