//! Tixera maturity sweeper.
//!
//! Runs the maturity sweep on a fixed interval until interrupted. Each
//! organizer is an independent atomic unit inside the sweep, so stopping
//! mid-run is always safe — the next run picks up where this one left
//! off.

use std::time::Duration;

use tokio::time;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tixera_db::connect;
use tixera_engine::MaturitySweep;
use tixera_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tixera=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let sweep = MaturitySweep::new(db);
    let mut ticker = time::interval(Duration::from_secs(config.sweep.interval_secs));
    info!(interval_secs = config.sweep.interval_secs, "Maturity sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sweep.run().await {
                    Ok(report) => info!(
                        seen = report.organizers_seen,
                        released = report.organizers_released,
                        total = %report.total_released,
                        errors = report.errors,
                        "Sweep tick finished"
                    ),
                    // A failed tick retries on the next one.
                    Err(e) => error!(error = %e, "Sweep tick failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
