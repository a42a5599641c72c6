//! Query parameter validation and normalization
//!
//! Converts raw, untrusted query-string parameters into typed requests.
//! Three entry points share the same helpers and differ only in which
//! parameters they recognize:
//!
//! - [`validate_list`] for `GET /api/measurements`
//! - [`validate_metrics`] for `GET /api/measurements/metrics`
//! - [`validate_range`] for `GET /api/measurements/range`
//!
//! Parameters are checked in a fixed order (field, dates, range, iso_code,
//! page, limit, sort, format) and the first failure wins. Empty-string
//! values are treated the same as absent ones, so `?page=&sort=` falls
//! back to defaults instead of erroring.

use crate::query::error::{QueryError, QueryResult};
use crate::store::{MeasurementFilter, MetricField, SortOrder};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 500;
/// Values above this clamp down silently; the clamp is a normalization,
/// not an error.
pub const MAX_LIMIT: u64 = 2000;

/// Raw parameters accepted by `GET /api/measurements`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub field: Option<String>,
    pub iso_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub format: Option<String>,
}

/// Raw parameters accepted by `GET /api/measurements/metrics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsParams {
    pub field: Option<String>,
    pub iso_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Raw parameters accepted by `GET /api/measurements/range`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeParams {
    pub field: Option<String>,
    pub iso_code: Option<String>,
}

/// Output shape of the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Bare ordered array of rows.
    Array,
    /// Pagination envelope around the rows.
    #[default]
    Object,
}

/// Fully validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub filter: MeasurementFilter,
    pub page: u64,
    pub limit: u64,
    pub sort: SortOrder,
    pub format: ResponseFormat,
}

/// Fully validated range request: iso filter only, no date bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRequest {
    pub field: MetricField,
    pub iso_code: Option<String>,
}

/// Validate and normalize raw list parameters.
pub fn validate_list(params: &ListParams) -> QueryResult<ListRequest> {
    let filter = validate_filter(
        params.field.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.iso_code.as_deref(),
    )?;

    let page = parse_positive(params.page.as_deref())
        .map_err(|_| QueryError::InvalidPage {
            value: params.page.clone().unwrap_or_default(),
        })?
        .unwrap_or(DEFAULT_PAGE);

    let limit = parse_positive(params.limit.as_deref())
        .map_err(|_| QueryError::InvalidLimit {
            value: params.limit.clone().unwrap_or_default(),
        })?
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);

    let sort = parse_sort(params.sort.as_deref())?;
    let format = parse_format(params.format.as_deref());

    Ok(ListRequest {
        filter,
        page,
        limit,
        sort,
        format,
    })
}

/// Validate and normalize raw metrics parameters.
pub fn validate_metrics(params: &MetricsParams) -> QueryResult<MeasurementFilter> {
    validate_filter(
        params.field.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.iso_code.as_deref(),
    )
}

/// Validate and normalize raw range parameters.
pub fn validate_range(params: &RangeParams) -> QueryResult<RangeRequest> {
    let field = parse_field(params.field.as_deref())?;
    let iso_code = parse_iso_code(params.iso_code.as_deref())?;
    Ok(RangeRequest { field, iso_code })
}

fn validate_filter(
    field: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    iso_code: Option<&str>,
) -> QueryResult<MeasurementFilter> {
    let field = parse_field(field)?;
    let start = parse_date_param("start_date", start_date, DayBound::Start)?;
    let end = parse_date_param("end_date", end_date, DayBound::End)?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(QueryError::InvalidRange {
                start_date: start_date.unwrap_or_default().to_string(),
                end_date: end_date.unwrap_or_default().to_string(),
            });
        }
    }

    let iso_code = parse_iso_code(iso_code)?;

    Ok(MeasurementFilter {
        field,
        iso_code,
        start,
        end,
    })
}

fn parse_field(raw: Option<&str>) -> QueryResult<MetricField> {
    raw.and_then(MetricField::parse)
        .ok_or_else(|| QueryError::InvalidField {
            value: raw.map(str::to_string),
        })
}

#[derive(Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn parse_date_param(
    param: &'static str,
    raw: Option<&str>,
    bound: DayBound,
) -> QueryResult<Option<DateTime<Utc>>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    match parse_day(raw, bound) {
        Some(instant) => Ok(Some(instant)),
        None => Err(QueryError::InvalidDate {
            param,
            value: raw.to_string(),
        }),
    }
}

/// Parse a literal `YYYY-MM-DD` string into the first or last instant of
/// that UTC day. Returns `None` for anything that is not a real calendar
/// date in exactly that shape.
fn parse_day(raw: &str, bound: DayBound) -> Option<DateTime<Utc>> {
    let shape = Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok()?;
    if !shape.is_match(raw) {
        return None;
    }

    // chrono rejects impossible dates like 2021-02-30 here
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        DayBound::Start => date.and_hms_opt(0, 0, 0)?,
        DayBound::End => date.and_hms_milli_opt(23, 59, 59, 999)?,
    };
    Some(time.and_utc())
}

fn parse_iso_code(raw: Option<&str>) -> QueryResult<Option<String>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    let iso = raw.trim().to_uppercase();
    if iso.chars().count() == 3 {
        Ok(Some(iso))
    } else {
        Err(QueryError::InvalidIsoCode {
            value: raw.to_string(),
        })
    }
}

/// `Ok(None)` when absent or empty, `Ok(Some(n))` for a strictly positive
/// integer, `Err(())` for everything else.
fn parse_positive(raw: Option<&str>) -> Result<Option<u64>, ()> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(()),
    }
}

fn parse_sort(raw: Option<&str>) -> QueryResult<SortOrder> {
    let Some(raw) = non_empty(raw) else {
        return Ok(SortOrder::Asc);
    };
    match raw.to_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(QueryError::InvalidSort {
            value: raw.to_string(),
        }),
    }
}

/// Only the exact string `array` selects the array shape; anything else,
/// including absence, normalizes to the paginated object. Never errors.
fn parse_format(raw: Option<&str>) -> ResponseFormat {
    match raw {
        Some("array") => ResponseFormat::Array,
        _ => ResponseFormat::Object,
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn list_params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for &(key, value) in pairs {
            let slot = match key {
                "field" => &mut params.field,
                "iso_code" => &mut params.iso_code,
                "start_date" => &mut params.start_date,
                "end_date" => &mut params.end_date,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "sort" => &mut params.sort,
                "format" => &mut params.format,
                _ => panic!("unknown param {key}"),
            };
            *slot = Some(value.to_string());
        }
        params
    }

    fn valid(pairs: &[(&str, &str)]) -> ListRequest {
        validate_list(&list_params(pairs)).unwrap()
    }

    fn invalid(pairs: &[(&str, &str)]) -> QueryError {
        validate_list(&list_params(pairs)).unwrap_err()
    }

    #[test]
    fn test_field_is_mandatory() {
        let err = validate_list(&ListParams::default()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidField { value: None }));
    }

    #[test]
    fn test_field_rejects_unknown_values() {
        for bad in ["field4", "FIELD1", "", "watts"] {
            let err = invalid(&[("field", bad)]);
            assert!(matches!(err, QueryError::InvalidField { .. }), "{bad}");
        }
        assert_eq!(valid(&[("field", "field2")]).filter.field, MetricField::Field2);
    }

    #[test]
    fn test_defaults() {
        let req = valid(&[("field", "field1")]);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 500);
        assert_eq!(req.sort, SortOrder::Asc);
        assert_eq!(req.format, ResponseFormat::Object);
        assert!(req.filter.iso_code.is_none());
        assert!(req.filter.start.is_none());
        assert!(req.filter.end.is_none());
    }

    #[test]
    fn test_empty_strings_fall_back_to_defaults() {
        let req = valid(&[
            ("field", "field1"),
            ("page", ""),
            ("limit", ""),
            ("sort", ""),
            ("start_date", ""),
            ("end_date", ""),
            ("iso_code", ""),
        ]);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 500);
        assert_eq!(req.sort, SortOrder::Asc);
        assert!(req.filter.iso_code.is_none());
        assert!(req.filter.start.is_none());
    }

    #[test]
    fn test_date_expansion_covers_the_whole_day() {
        let req = valid(&[
            ("field", "field1"),
            ("start_date", "2021-02-28"),
            ("end_date", "2021-02-28"),
        ]);
        let start = req.filter.start.unwrap();
        let end = req.filter.end.unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2021, 2, 28, 0, 0, 0).unwrap());
        assert_eq!(end.hour(), 23);
        assert_eq!(end.timestamp_subsec_millis(), 999);
        assert!(start < end);
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        for bad in ["2021-02-30", "2021-13-01", "2021-00-10", "2021-01-00"] {
            let err = invalid(&[("field", "field1"), ("start_date", bad)]);
            match err {
                QueryError::InvalidDate { param, value } => {
                    assert_eq!(param, "start_date");
                    assert_eq!(value, bad);
                }
                other => panic!("expected InvalidDate, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_date_shape_is_literal() {
        for bad in ["2021-2-3", "21-01-01", "2021/01/01", "2021-01-01T00:00:00", "yesterday"] {
            let err = invalid(&[("field", "field1"), ("end_date", bad)]);
            assert!(matches!(err, QueryError::InvalidDate { .. }), "{bad}");
        }
    }

    #[test]
    fn test_range_ordering() {
        let err = invalid(&[
            ("field", "field1"),
            ("start_date", "2021-05-01"),
            ("end_date", "2021-04-01"),
        ]);
        match err {
            QueryError::InvalidRange {
                start_date,
                end_date,
            } => {
                assert_eq!(start_date, "2021-05-01");
                assert_eq!(end_date, "2021-04-01");
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }

        // swapping the bounds succeeds
        let req = valid(&[
            ("field", "field1"),
            ("start_date", "2021-04-01"),
            ("end_date", "2021-05-01"),
        ]);
        assert!(req.filter.start.unwrap() < req.filter.end.unwrap());
    }

    #[test]
    fn test_iso_code_normalization() {
        let req = valid(&[("field", "field1"), ("iso_code", "usa")]);
        assert_eq!(req.filter.iso_code.as_deref(), Some("USA"));

        let req = valid(&[("field", "field1"), ("iso_code", " USA ")]);
        assert_eq!(req.filter.iso_code.as_deref(), Some("USA"));

        for bad in ["us", "USAX", "  "] {
            let err = invalid(&[("field", "field1"), ("iso_code", bad)]);
            assert!(matches!(err, QueryError::InvalidIsoCode { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_page_must_be_positive() {
        for bad in ["0", "-1", "abc", "12abc", "1.5"] {
            let err = invalid(&[("field", "field1"), ("page", bad)]);
            assert!(matches!(err, QueryError::InvalidPage { .. }), "{bad}");
        }
        assert_eq!(valid(&[("field", "field1"), ("page", "3")]).page, 3);
    }

    #[test]
    fn test_limit_rejects_and_clamps() {
        for bad in ["0", "-1", "abc"] {
            let err = invalid(&[("field", "field1"), ("limit", bad)]);
            assert!(matches!(err, QueryError::InvalidLimit { .. }), "{bad}");
        }

        assert_eq!(valid(&[("field", "field1"), ("limit", "250")]).limit, 250);
        assert_eq!(valid(&[("field", "field1"), ("limit", "2000")]).limit, 2000);
        // above the cap is not an error, it clamps
        assert_eq!(valid(&[("field", "field1"), ("limit", "5000")]).limit, 2000);
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        assert_eq!(
            valid(&[("field", "field1"), ("sort", "DESC")]).sort,
            SortOrder::Desc
        );
        assert_eq!(
            valid(&[("field", "field1"), ("sort", "Asc")]).sort,
            SortOrder::Asc
        );
        let err = invalid(&[("field", "field1"), ("sort", "up")]);
        assert!(matches!(err, QueryError::InvalidSort { .. }));
    }

    #[test]
    fn test_format_never_errors() {
        assert_eq!(
            valid(&[("field", "field1"), ("format", "array")]).format,
            ResponseFormat::Array
        );
        for other in ["ARRAY", "object", "csv", ""] {
            assert_eq!(
                valid(&[("field", "field1"), ("format", other)]).format,
                ResponseFormat::Object,
                "{other:?}"
            );
        }
    }

    #[test]
    fn test_validation_order_reports_field_first() {
        // field is checked before everything else
        let err = invalid(&[("field", "bogus"), ("start_date", "not-a-date"), ("page", "0")]);
        assert!(matches!(err, QueryError::InvalidField { .. }));

        // dates are checked before iso_code
        let err = invalid(&[
            ("field", "field1"),
            ("start_date", "not-a-date"),
            ("iso_code", "x"),
        ]);
        assert!(matches!(err, QueryError::InvalidDate { .. }));
    }

    #[test]
    fn test_metrics_entry_point_ignores_pagination() {
        let filter = validate_metrics(&MetricsParams {
            field: Some("field3".to_string()),
            iso_code: Some("deu".to_string()),
            start_date: Some("1990-01-01".to_string()),
            end_date: Some("2000-12-31".to_string()),
        })
        .unwrap();
        assert_eq!(filter.field, MetricField::Field3);
        assert_eq!(filter.iso_code.as_deref(), Some("DEU"));
        assert!(filter.start.is_some() && filter.end.is_some());
    }

    #[test]
    fn test_range_entry_point_accepts_iso_only() {
        let req = validate_range(&RangeParams {
            field: Some("field1".to_string()),
            iso_code: None,
        })
        .unwrap();
        assert_eq!(req.field, MetricField::Field1);
        assert!(req.iso_code.is_none());

        let err = validate_range(&RangeParams {
            field: Some("field1".to_string()),
            iso_code: Some("us".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIsoCode { .. }));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let req = valid(&[
            ("field", "field2"),
            ("iso_code", "usa"),
            ("start_date", "1995-06-15"),
            ("end_date", "2005-06-15"),
            ("page", "2"),
            ("limit", "100"),
            ("sort", "desc"),
            ("format", "array"),
        ]);

        // re-encode the validated request canonically and validate again
        let reencoded = list_params(&[
            ("field", req.filter.field.as_str()),
            ("iso_code", req.filter.iso_code.as_deref().unwrap()),
            (
                "start_date",
                &req.filter.start.unwrap().format("%Y-%m-%d").to_string(),
            ),
            (
                "end_date",
                &req.filter.end.unwrap().format("%Y-%m-%d").to_string(),
            ),
            ("page", &req.page.to_string()),
            ("limit", &req.limit.to_string()),
            ("sort", req.sort.as_str()),
            ("format", "array"),
        ]);

        assert_eq!(validate_list(&reencoded).unwrap(), req);
    }
}
