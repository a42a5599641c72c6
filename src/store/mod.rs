//! Measurement store
//!
//! SQLite-backed persistence for energy measurements: one row per
//! country/year observation, read back through typed filters.
//!
//! The store is the only place SQL exists; callers hand it a
//! [`MeasurementFilter`] and get typed results. Metric column names come
//! from the [`MetricField`] enum, never from raw request input.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::{population_std_dev, MeasurementStore};
pub use error::{StoreError, StoreResult};
pub use types::{
    DateRange, FieldStats, Measurement, MeasurementFilter, MeasurementPoint, MetricField,
    SortOrder,
};
