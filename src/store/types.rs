//! Core measurement types shared by the store, query, and API layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three energy metrics a query can target.
///
/// Wire names are `field1`/`field2`/`field3`; the columns hold, in order,
/// electricity demand per capita, carbon intensity of electricity, and
/// energy per capita (the OWID dataset columns the importer maps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricField {
    Field1,
    Field2,
    Field3,
}

impl MetricField {
    /// Wire names accepted by the `field` query parameter.
    pub const ALLOWED: [&'static str; 3] = ["field1", "field2", "field3"];

    /// Case-sensitive lookup by wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "field1" => Some(MetricField::Field1),
            "field2" => Some(MetricField::Field2),
            "field3" => Some(MetricField::Field3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Field1 => "field1",
            MetricField::Field2 => "field2",
            MetricField::Field3 => "field3",
        }
    }

    /// Column the metric lives in. Always one of a fixed set, so it is
    /// safe to splice into SQL.
    pub fn column(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp ordering for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One stored measurement: a country/year observation.
///
/// `timestamp` is the measurement year truncated to Jan 1 UTC. Metric
/// fields are numeric or null, never strings; `iso_code`, when present,
/// is exactly 3 uppercase characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub field1: Option<f64>,
    pub field2: Option<f64>,
    pub field3: Option<f64>,
    pub country: Option<String>,
    pub iso_code: Option<String>,
}

/// Validated query constraints shared by every read operation.
///
/// Constructed by the query validator, passed as an explicit argument,
/// discarded after the response is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementFilter {
    pub field: MetricField,
    /// Exact-match country filter, already trimmed and upper-cased.
    pub iso_code: Option<String>,
    /// Inclusive lower timestamp bound (first instant of the start day).
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound (last instant of the end day).
    pub end: Option<DateTime<Utc>>,
}

impl MeasurementFilter {
    /// Filter on a field alone, no constraints.
    pub fn for_field(field: MetricField) -> Self {
        Self {
            field,
            iso_code: None,
            start: None,
            end: None,
        }
    }
}

/// A projected row: timestamp plus the requested metric's value.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Aggregate statistics over one metric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (squared-deviation sum over `count`,
    /// not `count - 1`).
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
}

/// Inclusive timestamp bounds of the data matching a filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    #[serde(rename = "minDate")]
    pub min_date: DateTime<Utc>,
    #[serde(rename = "maxDate")]
    pub max_date: DateTime<Utc>,
}
