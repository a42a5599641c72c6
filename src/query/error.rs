//! Query error types
//!
//! One variant per client-visible error kind, each carrying the offending
//! value(s) so the HTTP layer can echo them back under `details`.

use crate::store::{MetricField, StoreError};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised by the validator and the query service.
///
/// Everything except `Store` is client-input class: detected before any
/// storage query runs, surfaced as HTTP 400 (or 404 for `NoData`), never
/// retried.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid field parameter.")]
    InvalidField { value: Option<String> },

    #[error("Invalid {param}. Expected YYYY-MM-DD.")]
    InvalidDate { param: &'static str, value: String },

    #[error("start_date must be before end_date.")]
    InvalidRange {
        start_date: String,
        end_date: String,
    },

    #[error("iso_code must be a 3-letter ISO code.")]
    InvalidIsoCode { value: String },

    #[error("page must be a positive integer.")]
    InvalidPage { value: String },

    #[error("limit must be a positive integer.")]
    InvalidLimit { value: String },

    #[error("sort must be asc or desc.")]
    InvalidSort { value: String },

    /// A legitimate filter that matched nothing. Expected and common;
    /// surfaced as 404 rather than an empty success payload.
    #[error("No data found for the specified range.")]
    NoData {
        field: MetricField,
        iso_code: Option<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Stable kind name, used as the `error` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidField { .. } => "InvalidField",
            QueryError::InvalidDate { .. } => "InvalidDate",
            QueryError::InvalidRange { .. } => "InvalidRange",
            QueryError::InvalidIsoCode { .. } => "InvalidIsoCode",
            QueryError::InvalidPage { .. } => "InvalidPage",
            QueryError::InvalidLimit { .. } => "InvalidLimit",
            QueryError::InvalidSort { .. } => "InvalidSort",
            QueryError::NoData { .. } => "NoData",
            QueryError::Store(_) => "InternalServerError",
        }
    }

    /// Context object for the `details` field of HTTP error bodies.
    /// Storage failures deliberately expose nothing.
    pub fn details(&self) -> Option<Value> {
        match self {
            QueryError::InvalidField { value } => Some(json!({
                "field": value,
                "allowed": MetricField::ALLOWED,
            })),
            QueryError::InvalidDate { param, value } => {
                let mut details = serde_json::Map::new();
                details.insert((*param).to_string(), json!(value));
                Some(Value::Object(details))
            }
            QueryError::InvalidRange {
                start_date,
                end_date,
            } => Some(json!({
                "start_date": start_date,
                "end_date": end_date,
            })),
            QueryError::InvalidIsoCode { value } => Some(json!({ "iso_code": value })),
            QueryError::InvalidPage { value } => Some(json!({ "page": value })),
            QueryError::InvalidLimit { value } => Some(json!({ "limit": value })),
            QueryError::InvalidSort { value } => Some(json!({ "sort": value })),
            QueryError::NoData { field, iso_code } => Some(json!({
                "field": field.as_str(),
                "iso_code": iso_code,
            })),
            QueryError::Store(_) => None,
        }
    }
}

/// Result type alias for validator and service operations
pub type QueryResult<T> = Result<T, QueryError>;
