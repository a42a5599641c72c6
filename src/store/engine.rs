//! Measurement store - SQLite-backed reads and batch writes.
//!
//! Translates typed [`MeasurementFilter`] values into SQL predicates:
//! `iso_code` equality when present, inclusive `timestamp` bounds when
//! either date is present. All statements go through `prepare_cached`;
//! the only dynamic SQL fragments are column and direction names drawn
//! from enums.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{
    DateRange, FieldStats, Measurement, MeasurementFilter, MeasurementPoint, MetricField,
    SortOrder,
};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed store for energy measurements.
///
/// Shared across request handlers behind an `Arc`; the connection lives
/// behind a mutex, so reads serialize. Queries are index-backed point and
/// aggregate lookups, cheap enough that this has not been a bottleneck.
pub struct MeasurementStore {
    conn: Mutex<Connection>,
}

impl MeasurementStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = 10000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests and benches.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                field1 REAL,
                field2 REAL,
                field3 REAL,
                country TEXT,
                iso_code TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_measurements_timestamp
                ON measurements(timestamp);
            CREATE INDEX IF NOT EXISTS idx_measurements_iso_timestamp
                ON measurements(iso_code, timestamp);",
        )?;
        Ok(())
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Insert measurements in a single transaction. Returns the number
    /// inserted.
    pub fn insert_batch(&self, rows: &[Measurement]) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO measurements (timestamp, field1, field2, field3, country, iso_code)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.timestamp.timestamp_millis(),
                    row.field1,
                    row.field2,
                    row.field3,
                    row.country,
                    row.iso_code,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Fetch one page of rows matching the filter, projected to the
    /// requested metric. The metric value may be null; list queries do not
    /// restrict to numeric values.
    pub fn fetch_points(
        &self,
        filter: &MeasurementFilter,
        sort: SortOrder,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<MeasurementPoint>> {
        let (clauses, mut params) = predicate(filter);
        let sql = format!(
            "SELECT timestamp, {col} FROM measurements{cond} ORDER BY timestamp {dir} LIMIT ? OFFSET ?",
            col = filter.field.column(),
            cond = where_sql(&clauses),
            dir = sort.sql(),
        );
        params.push(SqlValue::Integer(clamp_to_i64(limit)));
        params.push(SqlValue::Integer(clamp_to_i64(offset)));

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<f64>>(1)?))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (millis, value) = row?;
            points.push(MeasurementPoint {
                timestamp: timestamp_from_millis(millis)?,
                value,
            });
        }
        Ok(points)
    }

    /// Count every row matching the filter, ignoring pagination.
    pub fn count_matching(&self, filter: &MeasurementFilter) -> StoreResult<u64> {
        let (clauses, params) = predicate(filter);
        let sql = format!("SELECT COUNT(*) FROM measurements{}", where_sql(&clauses));

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let count: i64 = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Total row count, used by health checks and the importer.
    pub fn count_all(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT COUNT(*) FROM measurements")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Aggregate statistics for the filter's metric, over rows where that
    /// metric is numeric. Returns `None` when nothing matches.
    ///
    /// SQLite has no stddev aggregate, so the query pulls count, sum,
    /// sum-of-squares, min, and max, and [`population_std_dev`] finishes
    /// the job.
    pub fn field_stats(&self, filter: &MeasurementFilter) -> StoreResult<Option<FieldStats>> {
        let (mut clauses, params) = predicate(filter);
        let col = filter.field.column();
        clauses.push(format!("{col} IS NOT NULL"));
        let sql = format!(
            "SELECT COUNT({col}), SUM({col}), SUM({col} * {col}), MIN({col}), MAX({col})
             FROM measurements{cond}",
            col = col,
            cond = where_sql(&clauses),
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let (count, sum, sum_sq, min, max) = stmt.query_row(params_from_iter(params), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?;

        let (Some(sum), Some(sum_sq), Some(min), Some(max)) = (sum, sum_sq, min, max) else {
            return Ok(None);
        };
        if count <= 0 {
            return Ok(None);
        }

        let count = count as u64;
        Ok(Some(FieldStats {
            count,
            avg: sum / count as f64,
            min,
            max,
            std_dev: population_std_dev(count, sum, sum_sq),
        }))
    }

    /// Min/max timestamp across rows where the metric is numeric. Only the
    /// iso_code part of the filter applies; date bounds are ignored by
    /// design (the range endpoint discovers them).
    pub fn field_date_range(
        &self,
        field: MetricField,
        iso_code: Option<&str>,
    ) -> StoreResult<Option<DateRange>> {
        let col = field.column();
        let mut clauses = vec![format!("{col} IS NOT NULL")];
        let mut params = Vec::new();
        if let Some(iso) = iso_code {
            clauses.push("iso_code = ?".to_string());
            params.push(SqlValue::Text(iso.to_string()));
        }
        let sql = format!(
            "SELECT MIN(timestamp), MAX(timestamp) FROM measurements WHERE {}",
            clauses.join(" AND "),
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let (min, max) = stmt.query_row(params_from_iter(params), |row| {
            Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?))
        })?;

        match (min, max) {
            (Some(min), Some(max)) => Ok(Some(DateRange {
                min_date: timestamp_from_millis(min)?,
                max_date: timestamp_from_millis(max)?,
            })),
            _ => Ok(None),
        }
    }
}

/// Population standard deviation from streaming sums: the squared-deviation
/// total divided by `count`, not `count - 1`.
pub fn population_std_dev(count: u64, sum: f64, sum_sq: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    variance.sqrt()
}

fn predicate(filter: &MeasurementFilter) -> (Vec<String>, Vec<SqlValue>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(iso) = &filter.iso_code {
        clauses.push("iso_code = ?".to_string());
        params.push(SqlValue::Text(iso.clone()));
    }
    if let Some(start) = filter.start {
        clauses.push("timestamp >= ?".to_string());
        params.push(SqlValue::Integer(start.timestamp_millis()));
    }
    if let Some(end) = filter.end {
        clauses.push("timestamp <= ?".to_string());
        params.push(SqlValue::Integer(end.timestamp_millis()));
    }

    (clauses, params)
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn timestamp_from_millis(millis: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::Corruption(format!("timestamp out of range: {millis}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn year(y: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap()
    }

    fn row(y: i32, iso: &str, field1: Option<f64>) -> Measurement {
        Measurement {
            timestamp: year(y),
            field1,
            field2: None,
            field3: field1.map(|v| v * 2.0),
            country: Some("Somewhere".to_string()),
            iso_code: Some(iso.to_string()),
        }
    }

    fn seeded_store() -> MeasurementStore {
        let store = MeasurementStore::in_memory().unwrap();
        store
            .insert_batch(&[
                row(1990, "USA", Some(10.0)),
                row(1991, "USA", Some(20.0)),
                row(1992, "USA", Some(30.0)),
                row(1991, "USA", None),
                row(1991, "DEU", Some(100.0)),
            ])
            .unwrap();
        store
    }

    fn usa_filter() -> MeasurementFilter {
        MeasurementFilter {
            field: MetricField::Field1,
            iso_code: Some("USA".to_string()),
            start: None,
            end: None,
        }
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("measurements.db");
        let store = MeasurementStore::open(&path).unwrap();
        assert_eq!(store.count_all().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_fetch_points_sorted_and_projected() {
        let store = seeded_store();
        let points = store
            .fetch_points(&usa_filter(), SortOrder::Desc, 0, 500)
            .unwrap();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].timestamp, year(1992));
        assert_eq!(points[0].value, Some(30.0));
        // the null-valued 1991 row is still listed
        assert!(points.iter().any(|p| p.value.is_none()));
    }

    #[test]
    fn test_fetch_points_pagination() {
        let store = seeded_store();
        let page2 = store
            .fetch_points(&usa_filter(), SortOrder::Asc, 2, 2)
            .unwrap();
        assert_eq!(page2.len(), 2);
        let page3 = store
            .fetch_points(&usa_filter(), SortOrder::Asc, 4, 2)
            .unwrap();
        assert!(page3.is_empty());
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let store = seeded_store();
        let filter = MeasurementFilter {
            start: Some(year(1991)),
            end: Some(
                Utc.with_ymd_and_hms(1991, 12, 31, 23, 59, 59).unwrap(),
            ),
            ..usa_filter()
        };
        let points = store.fetch_points(&filter, SortOrder::Asc, 0, 500).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.timestamp == year(1991)));
    }

    #[test]
    fn test_count_matching_ignores_field_nullness() {
        let store = seeded_store();
        assert_eq!(store.count_matching(&usa_filter()).unwrap(), 4);
        assert_eq!(
            store
                .count_matching(&MeasurementFilter::for_field(MetricField::Field1))
                .unwrap(),
            5
        );
    }

    #[test]
    fn test_field_stats_known_values() {
        let store = seeded_store();
        let stats = store.field_stats(&usa_filter()).unwrap().unwrap();

        assert_eq!(stats.count, 3);
        assert!((stats.avg - 20.0).abs() < 1e-9);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert!((stats.std_dev - 8.16496580927726).abs() < 1e-9);
    }

    #[test]
    fn test_field_stats_skips_null_metric() {
        let store = seeded_store();
        // field2 is never set for USA
        let filter = MeasurementFilter {
            field: MetricField::Field2,
            ..usa_filter()
        };
        assert!(store.field_stats(&filter).unwrap().is_none());
    }

    #[test]
    fn test_field_stats_empty_filter() {
        let store = MeasurementStore::in_memory().unwrap();
        let stats = store
            .field_stats(&MeasurementFilter::for_field(MetricField::Field1))
            .unwrap();
        assert!(stats.is_none());
    }

    #[test]
    fn test_field_date_range() {
        let store = seeded_store();
        let range = store
            .field_date_range(MetricField::Field1, Some("USA"))
            .unwrap()
            .unwrap();
        assert_eq!(range.min_date, year(1990));
        assert_eq!(range.max_date, year(1992));

        assert!(store
            .field_date_range(MetricField::Field1, Some("FRA"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_population_std_dev() {
        // values [10, 20, 30]: mean 20, population variance 200/3
        let std_dev = population_std_dev(3, 60.0, 1400.0);
        assert!((std_dev - 8.16496580927726).abs() < 1e-12);

        assert_eq!(population_std_dev(0, 0.0, 0.0), 0.0);
        assert_eq!(population_std_dev(1, 5.0, 25.0), 0.0);
    }

    #[test]
    fn test_population_std_dev_never_negative_variance() {
        // rounding can push sum_sq/n fractionally below mean^2
        let std_dev = population_std_dev(3, 30.0, 299.99999999999994);
        assert!(std_dev >= 0.0);
    }
}
