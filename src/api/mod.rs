//! Gridpulse REST API
//!
//! HTTP API layer for Gridpulse, built with Axum.
//!
//! # Endpoints
//!
//! ## Measurements
//! - `GET /api/measurements` - filtered, paginated measurement list
//! - `GET /api/measurements/metrics` - aggregate statistics
//! - `GET /api/measurements/range` - available date bounds
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! Requests that match no route fall through to the configured static
//! frontend directory when it exists, and otherwise get a JSON 404.
//!
//! # Example
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
//!     let store = Arc::new(MeasurementStore::open(Path::new(&config.database.path))?);
//!     let state = AppState::new(store, config.api.clone());
//!     serve(state, &config.api).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    handler::HandlerWithoutStateExt,
    http::{header, Method, Uri},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let measurement_routes = Router::new()
        .route("/", get(routes::measurements::list_measurements))
        .route("/metrics", get(routes::measurements::measurement_metrics))
        .route("/range", get(routes::measurements::measurement_range));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Browser clients may be served from anywhere; the API is read-only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .nest("/api/measurements", measurement_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state));

    match static_dir {
        Some(dir) if Path::new(&dir).is_dir() => router.fallback_service(
            ServeDir::new(dir).not_found_service(route_not_found.into_service()),
        ),
        _ => router.fallback(route_not_found),
    }
}

/// JSON 404 for anything no route or static file matched.
async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        path: uri.path().to_string(),
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gridpulse API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Gridpulse API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
