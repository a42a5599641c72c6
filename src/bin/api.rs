//! Gridpulse API Server
//!
//! Run with: cargo run --bin gridpulse-api
//!
//! # Configuration
//!
//! Reads `config.toml` from the usual locations (see [`Config`]), with
//! environment overrides:
//! - `GRIDPULSE_DB_PATH`: SQLite database file
//! - `GRIDPULSE_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `GRIDPULSE_API_PORT`: Port to listen on (default: 3000)
//! - `GRIDPULSE_STATIC_DIR`: Static frontend directory (default: ./public)
//! - `RUST_LOG`: Log filter (overrides the config log level)

use anyhow::Context;
use gridpulse::api::{serve, AppState};
use gridpulse::config::{Config, LoggingConfig};
use gridpulse::store::MeasurementStore;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!(
        "Starting Gridpulse API server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Database: {}", config.database.path);

    let store = MeasurementStore::open(Path::new(&config.database.path))
        .with_context(|| format!("opening measurement store at {}", config.database.path))?;

    match store.count_all() {
        Ok(count) => tracing::info!("Measurement store ready ({} rows)", count),
        Err(e) => tracing::warn!("Measurement store opened but not readable: {}", e),
    }

    let state = AppState::new(Arc::new(store), config.api.clone());
    serve(state, &config.api).await?;

    tracing::info!("Gridpulse API server stopped");
    Ok(())
}

/// Initialize tracing from the logging config; `RUST_LOG` wins when set.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "gridpulse={},tower_http=info",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
