//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::ApiConfig;
use crate::query::MeasurementService;
use crate::store::MeasurementStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Measurement store, also used directly by health checks
    pub store: Arc<MeasurementStore>,
    /// Query service executing validated requests
    pub service: Arc<MeasurementService>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<MeasurementStore>, config: ApiConfig) -> Self {
        let service = Arc::new(MeasurementService::new(Arc::clone(&store)));
        Self {
            store,
            service,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
