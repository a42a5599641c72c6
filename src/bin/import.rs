//! OWID Energy Dataset Importer
//!
//! Run with: cargo run --bin gridpulse-import [-- <csv-path>]
//!
//! Loads per-country/year energy measurements from the OWID energy CSV
//! into the gridpulse store. With no path argument it uses
//! `./owid-energy-data.csv`, downloading the dataset first when the file
//! is missing.
//!
//! Rows are skipped when the iso_code is not exactly 3 characters (OWID
//! aggregate regions like `OWID_WRL`), the year does not parse, or all
//! three metric columns are empty.

use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use clap::Parser;
use gridpulse::config::Config;
use gridpulse::store::{Measurement, MeasurementStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CSV_URL: &str = "https://owid-public.owid.io/data/energy/owid-energy-data.csv";
const DEFAULT_CSV_FILE: &str = "owid-energy-data.csv";
const BATCH_SIZE: usize = 1000;

/// Import OWID energy data into the measurement store.
#[derive(Parser, Debug)]
#[command(name = "gridpulse-import", version, about)]
struct Args {
    /// CSV file to import. Defaults to ./owid-energy-data.csv, downloading
    /// it first when missing.
    csv: Option<PathBuf>,

    /// Override the database path from the config file.
    #[arg(long)]
    database: Option<PathBuf>,

    /// URL to download the dataset from when no local file exists.
    #[arg(long, default_value = DEFAULT_CSV_URL)]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridpulse=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load_default();

    let csv_path = match &args.csv {
        Some(path) => {
            if !path.exists() {
                bail!("CSV file not found: {}", path.display());
            }
            path.clone()
        }
        None => {
            let path = PathBuf::from(DEFAULT_CSV_FILE);
            if !path.exists() {
                tracing::info!("CSV not found, downloading from {}", args.url);
                download_csv(&args.url, &path).await?;
            }
            path
        }
    };

    let db_path = args
        .database
        .unwrap_or_else(|| PathBuf::from(&config.database.path));
    let store = MeasurementStore::open(&db_path)
        .with_context(|| format!("opening measurement store at {}", db_path.display()))?;

    tracing::info!("Importing {} into {}", csv_path.display(), db_path.display());
    let report = import_csv(&store, &csv_path)?;

    tracing::info!(
        "Done. Read {}, inserted {}, skipped {}",
        report.read,
        report.inserted,
        report.skipped
    );
    tracing::info!("Store now holds {} measurements", store.count_all()?);
    Ok(())
}

async fn download_csv(url: &str, dest: &Path) -> anyhow::Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("downloading {url}"))?
        .error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    tracing::info!("CSV downloaded to {}", dest.display());
    Ok(())
}

#[derive(Debug, Default)]
struct ImportReport {
    read: usize,
    inserted: usize,
    skipped: usize,
}

fn import_csv(store: &MeasurementStore, path: &Path) -> anyhow::Result<ImportReport> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut report = ImportReport::default();
    let mut batch: Vec<Measurement> = Vec::with_capacity(BATCH_SIZE);

    for record in reader.records() {
        let record = record?;
        report.read += 1;

        let Some(row) = columns.parse_row(&record) else {
            report.skipped += 1;
            continue;
        };

        batch.push(row);
        if batch.len() >= BATCH_SIZE {
            report.inserted += store.insert_batch(&batch)?;
            batch.clear();
            tracing::info!(
                "Progress: read {}, inserted {}, skipped {}",
                report.read,
                report.inserted,
                report.skipped
            );
        }
    }

    if !batch.is_empty() {
        report.inserted += store.insert_batch(&batch)?;
    }

    Ok(report)
}

/// Indices of the OWID columns the store cares about.
struct ColumnMap {
    iso_code: usize,
    country: usize,
    year: usize,
    field1: usize,
    field2: usize,
    field3: usize,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> anyhow::Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("CSV is missing the `{name}` column"))
        };
        Ok(Self {
            iso_code: find("iso_code")?,
            country: find("country")?,
            year: find("year")?,
            field1: find("electricity_demand_per_capita")?,
            field2: find("carbon_intensity_elec")?,
            field3: find("energy_per_capita")?,
        })
    }

    /// Returns `None` for rows the importer skips.
    fn parse_row(&self, record: &csv::StringRecord) -> Option<Measurement> {
        let iso_code = record.get(self.iso_code)?.trim();
        if iso_code.chars().count() != 3 {
            return None;
        }

        let year: i32 = record.get(self.year)?.trim().parse().ok()?;
        let timestamp = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;

        let field1 = parse_metric(record.get(self.field1));
        let field2 = parse_metric(record.get(self.field2));
        let field3 = parse_metric(record.get(self.field3));
        if field1.is_none() && field2.is_none() && field3.is_none() {
            return None;
        }

        let country = record
            .get(self.country)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Some(Measurement {
            timestamp,
            field1,
            field2,
            field3,
            country,
            iso_code: Some(iso_code.to_string()),
        })
    }
}

fn parse_metric(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
