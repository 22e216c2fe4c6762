//! trustmod maintenance worker.
//!
//! Connects to the database, applies migrations and runs the moderation
//! maintenance loop until interrupted.

mod maintenance;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use trustmod_common::{ClockService, Config, SystemClock};
use trustmod_core::{AccountStatusStore, ReportLifecycle};
use trustmod_db::repositories::{SeaOrmAccountStore, SeaOrmReportStore};

use crate::maintenance::Maintenance;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, stopping worker...");
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "trustmod=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(config.logging.json);

    info!("Starting trustmod worker...");

    let db = Arc::new(trustmod_db::init(&config).await?);
    info!("Connected to database");

    trustmod_db::migrate(&db).await?;
    info!("Migrations completed");

    let clock: ClockService = Arc::new(SystemClock);
    let account_store = Arc::new(SeaOrmAccountStore::new(db.clone()));
    let report_store = Arc::new(SeaOrmReportStore::new(db));

    let accounts = AccountStatusStore::new(account_store.clone(), clock.clone());
    let reports = ReportLifecycle::new(report_store, account_store, clock);
    let maintenance = Maintenance::new(accounts, reports, config.stale_claim_after());

    let period = Duration::from_secs(config.moderation.maintenance_interval_secs.max(1));
    info!(interval_secs = period.as_secs(), "Maintenance loop started");
    maintenance.run(period, shutdown_signal()).await;

    info!("Worker shutdown complete");
    Ok(())
}
