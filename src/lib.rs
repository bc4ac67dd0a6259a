pub mod allocator; // Appointment ids and queue tokens
pub mod api; // HTTP surface
pub mod appointment; // Appointment Store
pub mod availability; // Availability Tracker
pub mod checkin; // QR check-in
pub mod clinic_state; // Shared engine state + error taxonomy
pub mod config;
pub mod db;
pub mod models;
pub mod queue; // Queue Coordinator
pub mod report; // Report Attachment
pub mod scope_lock;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::clinic_state::{ClinicError, ClinicState};
use crate::config::ClinicConfig;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Load configuration, open the clinic database and serve the API until Ctrl-C.
pub async fn run() -> Result<(), ClinicError> {
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ClinicConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let clinic = Arc::new(ClinicState::open(config)?);

    let server = api::start_server_on(clinic, bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Accepting requests");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, draining requests");
    server.stop().await;

    Ok(())
}
