//! Measurement query service
//!
//! Executes validated requests against the store: paginated point lists,
//! aggregate statistics, and date-range discovery. All operations are
//! read-only and idempotent; an empty result is reported as
//! [`QueryError::NoData`] rather than an empty success payload.

use crate::query::error::{QueryError, QueryResult};
use crate::query::params::{ListRequest, RangeRequest, ResponseFormat};
use crate::store::{DateRange, FieldStats, MeasurementFilter, MeasurementPoint, MeasurementStore};
use std::sync::Arc;

/// Read-side service over the measurement store.
pub struct MeasurementService {
    store: Arc<MeasurementStore>,
}

/// Result of the list operation, shaped by the requested format.
#[derive(Debug, Clone, PartialEq)]
pub enum ListReply {
    /// `format=array`: the bare ordered rows.
    Rows(Vec<MeasurementPoint>),
    /// `format=object`: rows plus pagination bookkeeping.
    Page(PageReply),
}

/// Pagination envelope for `format=object` list replies.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReply {
    pub page: u64,
    pub limit: u64,
    /// Total matches ignoring pagination.
    pub total: u64,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
    pub data: Vec<MeasurementPoint>,
}

impl MeasurementService {
    pub fn new(store: Arc<MeasurementStore>) -> Self {
        Self { store }
    }

    /// Fetch one page of measurements.
    ///
    /// In `array` format an empty page is `NoData`. In `object` format the
    /// total match count decides: a page past the end of a non-empty
    /// result set succeeds with empty `data`, while zero matches overall
    /// is `NoData`. The page fetch and the count are independent reads
    /// with no snapshot guarantee between them.
    pub async fn list(&self, req: &ListRequest) -> QueryResult<ListReply> {
        let offset = (req.page - 1).saturating_mul(req.limit);
        let rows = self
            .store
            .fetch_points(&req.filter, req.sort, offset, req.limit)?;

        match req.format {
            ResponseFormat::Array => {
                if rows.is_empty() {
                    return Err(no_data(&req.filter));
                }
                Ok(ListReply::Rows(rows))
            }
            ResponseFormat::Object => {
                let total = self.store.count_matching(&req.filter)?;
                if total == 0 {
                    return Err(no_data(&req.filter));
                }
                Ok(ListReply::Page(PageReply {
                    page: req.page,
                    limit: req.limit,
                    total,
                    total_pages: total.div_ceil(req.limit),
                    data: rows,
                }))
            }
        }
    }

    /// Aggregate statistics over rows where the requested metric is
    /// numeric.
    pub async fn metrics(&self, filter: &MeasurementFilter) -> QueryResult<FieldStats> {
        match self.store.field_stats(filter)? {
            Some(stats) => Ok(stats),
            None => Err(no_data(filter)),
        }
    }

    /// Timestamp bounds of the rows where the requested metric is numeric.
    pub async fn range(&self, req: &RangeRequest) -> QueryResult<DateRange> {
        match self
            .store
            .field_date_range(req.field, req.iso_code.as_deref())?
        {
            Some(range) => Ok(range),
            None => Err(QueryError::NoData {
                field: req.field,
                iso_code: req.iso_code.clone(),
            }),
        }
    }
}

fn no_data(filter: &MeasurementFilter) -> QueryError {
    QueryError::NoData {
        field: filter.field,
        iso_code: filter.iso_code.clone(),
    }
}
