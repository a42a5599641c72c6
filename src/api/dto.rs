//! Data Transfer Objects
//!
//! Response types for the API endpoints. The metrics and range bodies are
//! the store's `FieldStats` / `DateRange` serialized directly; this module
//! holds the shapes that need assembly.

use serde::Serialize;
use serde_json::{json, Value};

use crate::query::PageReply;
use crate::store::{MeasurementPoint, MetricField};

/// Paginated list body for `format=object`.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub data: Vec<Value>,
}

impl PageResponse {
    pub fn from_reply(field: MetricField, reply: &PageReply) -> Self {
        Self {
            page: reply.page,
            limit: reply.limit,
            total: reply.total,
            total_pages: reply.total_pages,
            data: measurement_rows(field, &reply.data),
        }
    }
}

/// Project points into `{"timestamp": ..., "<field>": ...}` objects. The
/// metric key is the requested field's wire name; null values stay
/// present rather than being dropped.
pub fn measurement_rows(field: MetricField, points: &[MeasurementPoint]) -> Vec<Value> {
    points
        .iter()
        .map(|point| {
            let mut row = serde_json::Map::new();
            row.insert("timestamp".to_string(), json!(point.timestamp));
            row.insert(field.as_str().to_string(), json!(point.value));
            Value::Object(row)
        })
        .collect()
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub uptime_seconds: u64,
    pub version: String,
}
