//! Shared types for the clinic API layer.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::appointment;
use crate::clinic_state::{ClinicError, ClinicState};

// ═══════════════════════════════════════════════════════════
// API context — shared state for the clinic router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub clinic: Arc<ClinicState>,
}

impl ApiContext {
    pub fn new(clinic: Arc<ClinicState>) -> Self {
        Self { clinic }
    }

    /// Run an engine operation off the async runtime.
    ///
    /// Engine calls hold SQLite connections and may wait on scope locks,
    /// so they never run on a runtime worker thread.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&ClinicState) -> Result<T, ClinicError> + Send + 'static,
    {
        let clinic = Arc::clone(&self.clinic);
        tokio::task::spawn_blocking(move || op(&clinic))
            .await
            .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
            .map_err(ApiError::from)
    }
}

// ═══════════════════════════════════════════════════════════
// Query parameters
// ═══════════════════════════════════════════════════════════

/// `?date=YYYY-MM-DD`, defaulting to today's local date.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    pub fn resolve(&self) -> Result<NaiveDate, ApiError> {
        match self.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Ok(appointment::parse_date(raw)?),
            _ => Ok(ClinicState::today()),
        }
    }
}

/// `?mobile=XXXXXXXXXX`
#[derive(Debug, Deserialize)]
pub struct MobileQuery {
    pub mobile: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_query_defaults_to_today() {
        assert_eq!(DateQuery::default().resolve().unwrap(), ClinicState::today());
        let blank = DateQuery {
            date: Some("  ".into()),
        };
        assert_eq!(blank.resolve().unwrap(), ClinicState::today());
    }

    #[test]
    fn date_query_parses_and_rejects() {
        let q = DateQuery {
            date: Some("2024-05-01".into()),
        };
        assert_eq!(q.resolve().unwrap(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let bad = DateQuery {
            date: Some("May 1st".into()),
        };
        assert!(matches!(
            bad.resolve().unwrap_err(),
            ApiError::Clinic(ClinicError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn run_maps_engine_errors() {
        let (clinic, _tmp) = crate::clinic_state::test_support::test_state();
        let ctx = ApiContext::new(clinic);
        let err = ctx
            .run(|c| crate::appointment::get(c, 404))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Clinic(ClinicError::AppointmentNotFound(404))));
    }
}
