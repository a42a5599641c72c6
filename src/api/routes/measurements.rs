//! Measurement Routes
//!
//! The three read endpoints over stored measurements.
//!
//! - GET /api/measurements - filtered, paginated point list
//! - GET /api/measurements/metrics - aggregate statistics
//! - GET /api/measurements/range - available date bounds

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{measurement_rows, PageResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::query::{
    validate_list, validate_metrics, validate_range, ListParams, ListReply, MetricsParams,
    RangeParams,
};
use crate::store::{DateRange, FieldStats};

/// GET /api/measurements
///
/// Validates the raw parameters, then returns either the bare row array
/// (`format=array`) or the pagination envelope (`format=object`).
pub async fn list_measurements(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<ListParams>,
) -> ApiResult<Response> {
    let request = validate_list(&raw)?;
    let field = request.filter.field;

    let body = match state.service.list(&request).await? {
        ListReply::Rows(rows) => Json(measurement_rows(field, &rows)).into_response(),
        ListReply::Page(page) => Json(PageResponse::from_reply(field, &page)).into_response(),
    };
    Ok(body)
}

/// GET /api/measurements/metrics
///
/// Aggregate statistics (count/avg/min/max/stdDev) over the rows where
/// the requested metric is numeric.
pub async fn measurement_metrics(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<MetricsParams>,
) -> ApiResult<Json<FieldStats>> {
    let filter = validate_metrics(&raw)?;
    let stats = state.service.metrics(&filter).await?;
    Ok(Json(stats))
}

/// GET /api/measurements/range
///
/// Min/max timestamp of the rows where the requested metric is numeric.
pub async fn measurement_range(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RangeParams>,
) -> ApiResult<Json<DateRange>> {
    let request = validate_range(&raw)?;
    let range = state.service.range(&request).await?;
    Ok(Json(range))
}
