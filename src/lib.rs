pub mod api; // HTTP API: public booking, portal, gated back office
pub mod appointment; // Booking and appointment lifecycle
pub mod authorization; // Route access gate and sidebar
pub mod booking; // Public booking form state
pub mod calendar; // Day, week and month views
pub mod config;
pub mod core_state; // Shared server state and audit buffer
pub mod dashboard;
pub mod db;
pub mod identity; // Logins, password hashing, roles
pub mod models;
pub mod portal; // Patient self-service
pub mod slots; // Slot grid and availability

use tracing_subscriber::EnvFilter;

/// Entry point for the `clinicdesk` binary.
pub async fn run() -> Result<(), api::ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = config::ServerConfig::from_env();
    tracing::info!(
        version = config::APP_VERSION,
        bind = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "Clinicdesk starting"
    );

    api::serve(config).await
}
