//! Gridpulse query core
//!
//! The two halves of the non-trivial logic:
//!
//! - **Validator** ([`params`]): turns raw, untrusted query-string
//!   parameters into typed, normalized requests, or fails with a
//!   structured client error before any storage I/O happens.
//! - **Service** ([`service`]): executes a validated request against the
//!   store - point lists, aggregate statistics, or date-range bounds.
//!
//! # Example
//!
//! ```rust,no_run
//! use gridpulse::query::{validate_list, ListParams, MeasurementService};
//! use gridpulse::store::MeasurementStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MeasurementStore::in_memory()?);
//! let service = MeasurementService::new(store);
//!
//! let params = ListParams {
//!     field: Some("field1".to_string()),
//!     iso_code: Some("usa".to_string()),
//!     ..Default::default()
//! };
//! let request = validate_list(&params)?;
//! let reply = service.list(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod params;
pub mod service;

pub use error::{QueryError, QueryResult};
pub use params::{
    validate_list, validate_metrics, validate_range, ListParams, ListRequest, MetricsParams,
    RangeParams, RangeRequest, ResponseFormat, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT,
};
pub use service::{ListReply, MeasurementService, PageReply};
