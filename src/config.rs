use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MediQueue";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minutes budgeted per consultation when estimating waits.
pub const DEFAULT_CONSULT_MINUTES: u32 = 15;

/// Outstanding consultations tolerated before a doctor reads as busy.
pub const DEFAULT_BUSY_THRESHOLD: u32 = 0;

/// How long a request may wait on a contended scope before giving up.
pub const DEFAULT_LOCK_BUDGET_MS: u64 = 2000;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Queue date used for every booking under `RolloverPolicy::Continuous` (1970-01-01).
pub fn continuous_queue_date() -> NaiveDate {
    NaiveDate::default()
}

/// Get the application data directory
/// ~/MediQueue/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("MediQueue")
}

/// Default clinic database location.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "mediqueue=info,tower_http=info"
}

// ═══════════════════════════════════════════════════════════
// Day rollover
// ═══════════════════════════════════════════════════════════

/// What happens to queue counters when the calendar date changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloverPolicy {
    /// One queue per (department, date): tokens restart at 1 every day.
    Daily,
    /// One queue per department for all dates: tokens never restart.
    Continuous,
}

impl RolloverPolicy {
    /// Date under which the queue for an appointment on `date` is kept.
    pub fn queue_date(&self, date: NaiveDate) -> NaiveDate {
        match self {
            RolloverPolicy::Daily => date,
            RolloverPolicy::Continuous => continuous_queue_date(),
        }
    }
}

impl std::str::FromStr for RolloverPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RolloverPolicy::Daily),
            "continuous" => Ok(RolloverPolicy::Continuous),
            other => Err(ConfigError::Invalid {
                key: "MEDIQUEUE_ROLLOVER",
                value: other.to_string(),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Clinic configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Deployment configuration for the clinic engine and its HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Fallback consultation length; `system_settings.wait_time` overrides it.
    pub consult_minutes: u32,
    pub busy_threshold: u32,
    pub lock_budget_ms: u64,
    pub rollover: RolloverPolicy,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 5000))),
            db_path: default_db_path(),
            consult_minutes: DEFAULT_CONSULT_MINUTES,
            busy_threshold: DEFAULT_BUSY_THRESHOLD,
            lock_budget_ms: DEFAULT_LOCK_BUDGET_MS,
            rollover: RolloverPolicy::Daily,
        }
    }
}

impl ClinicConfig {
    /// Build configuration from `MEDIQUEUE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (unset keys keep defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("MEDIQUEUE_BIND") {
            config.bind_addr = parse_value("MEDIQUEUE_BIND", &v)?;
        }
        if let Some(v) = lookup("MEDIQUEUE_DB_PATH") {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MEDIQUEUE_CONSULT_MINUTES") {
            config.consult_minutes = parse_value("MEDIQUEUE_CONSULT_MINUTES", &v)?;
        }
        if let Some(v) = lookup("MEDIQUEUE_BUSY_THRESHOLD") {
            config.busy_threshold = parse_value("MEDIQUEUE_BUSY_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("MEDIQUEUE_LOCK_BUDGET_MS") {
            config.lock_budget_ms = parse_value("MEDIQUEUE_LOCK_BUDGET_MS", &v)?;
        }
        if let Some(v) = lookup("MEDIQUEUE_ROLLOVER") {
            config.rollover = v.parse()?;
        }

        Ok(config)
    }

    pub fn lock_budget(&self) -> Duration {
        Duration::from_millis(self.lock_budget_ms)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("MediQueue"));
        assert!(default_db_path().ends_with("clinic.db"));
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClinicConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.consult_minutes, 15);
        assert_eq!(config.busy_threshold, 0);
        assert_eq!(config.lock_budget_ms, 2000);
        assert_eq!(config.rollover, RolloverPolicy::Daily);
        assert_eq!(config.bind_addr.port(), 5000);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ClinicConfig::from_lookup(lookup_from(&[
            ("MEDIQUEUE_BIND", "0.0.0.0:8080"),
            ("MEDIQUEUE_CONSULT_MINUTES", "20"),
            ("MEDIQUEUE_BUSY_THRESHOLD", "2"),
            ("MEDIQUEUE_ROLLOVER", "Continuous"),
            ("MEDIQUEUE_DB_PATH", "/tmp/clinic.db"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.consult_minutes, 20);
        assert_eq!(config.busy_threshold, 2);
        assert_eq!(config.rollover, RolloverPolicy::Continuous);
        assert_eq!(config.db_path, PathBuf::from("/tmp/clinic.db"));
    }

    #[test]
    fn unparseable_value_is_rejected() {
        let err = ClinicConfig::from_lookup(lookup_from(&[("MEDIQUEUE_CONSULT_MINUTES", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("MEDIQUEUE_CONSULT_MINUTES"));

        assert!(ClinicConfig::from_lookup(lookup_from(&[("MEDIQUEUE_ROLLOVER", "weekly")])).is_err());
    }

    #[test]
    fn rollover_maps_queue_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(RolloverPolicy::Daily.queue_date(date), date);
        assert_eq!(
            RolloverPolicy::Continuous.queue_date(date).to_string(),
            "1970-01-01"
        );
    }
}
