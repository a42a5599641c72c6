//! # Gridpulse
//!
//! Energy measurement API - stores per-country/year energy metrics and
//! serves filtered queries, aggregate statistics, and date-range discovery
//! over HTTP.
//!
//! ## Modules
//!
//! - [`store`]: SQLite-backed measurement store
//! - [`query`]: parameter validation and the measurement query service
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridpulse::api::{serve, AppState};
//! use gridpulse::config::Config;
//! use gridpulse::store::MeasurementStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     // Open the measurement database (populated by gridpulse-import)
//!     let store = Arc::new(MeasurementStore::open(Path::new(&config.database.path))?);
//!
//!     // Serve the API until SIGINT/SIGTERM
//!     let state = AppState::new(store, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod query;
pub mod store;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError};

pub use query::{
    validate_list, validate_metrics, validate_range, ListParams, ListReply, ListRequest,
    MeasurementService, MetricsParams, PageReply, QueryError, RangeParams, RangeRequest,
    ResponseFormat,
};

pub use store::{
    population_std_dev, DateRange, FieldStats, Measurement, MeasurementFilter, MeasurementPoint,
    MeasurementStore, MetricField, SortOrder, StoreError, StoreResult,
};
