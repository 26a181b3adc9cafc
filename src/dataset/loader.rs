//! CSV dataset loading.
//!
//! Reads accident records from a local file or a remote URL. Header
//! names are matched loosely (see [`Column::from_header`]); rows with a
//! blank or invalid value in any recognised column are dropped and
//! counted rather than failing the load.

use super::{synthetic, DataSource, Dataset, Schema};
use crate::error::LoadError;
use crate::models::{parse_helmet, AccidentRecord, Column};
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for loading a dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts after a failed remote fetch.
    pub retries: usize,
    /// Whether to show a spinner during remote downloads.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retries: 1,
            show_progress: false,
        }
    }
}

/// Load a dataset from any source.
pub async fn load(source: &DataSource, options: &LoadOptions) -> Result<Dataset, LoadError> {
    match source {
        DataSource::File(path) => load_file(path),
        DataSource::Url(url) => {
            let body = fetch(url, options).await?;
            parse_csv(body.as_slice(), url)
        }
        DataSource::Synthetic { rows, seed } => Ok(synthetic::generate(*rows, *seed)),
    }
}

fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    debug!("Reading dataset from {}", path.display());
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_csv(file, &path.display().to_string())
}

/// Parse CSV text into a dataset.
pub fn parse_csv<R: Read>(reader: R, source_label: &str) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Header {
            source_label: source_label.to_string(),
            source,
        })?
        .clone();

    // A file with no header row at all holds no data rather than a
    // partial schema; every metric stays computable and empty.
    if headers.is_empty() {
        warn!("{} is empty", source_label);
        return Ok(Dataset::from_records(source_label, Vec::new()));
    }

    let layout = column_layout(&headers);
    let schema = Schema::from_columns(layout.iter().map(|(_, column)| *column));

    let missing = schema.missing(&Column::ALL);
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(Column::name).collect();
        warn!("Dataset has no column for: {}", names.join(", "));
    }

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;

    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|row| parse_row(&row, &layout));

        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!("Skipping line {}: {}", line, reason);
                skipped_rows += 1;
            }
        }
    }

    if skipped_rows > 0 {
        warn!("Skipped {} malformed row(s) in {}", skipped_rows, source_label);
    }
    info!("Loaded {} records from {}", records.len(), source_label);

    Ok(Dataset {
        source: source_label.to_string(),
        schema,
        records,
        skipped_rows,
    })
}

/// Map header positions to known columns. The first occurrence of a
/// column wins; unknown headers are ignored.
fn column_layout(headers: &StringRecord) -> Vec<(usize, Column)> {
    let mut layout: Vec<(usize, Column)> = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        match Column::from_header(header) {
            Some(column) if layout.iter().any(|(_, c)| *c == column) => {
                warn!("Duplicate column {:?} ignored", header);
            }
            Some(column) => layout.push((index, column)),
            None => debug!("Ignoring unrecognised column {:?}", header),
        }
    }

    layout
}

fn parse_row(row: &StringRecord, layout: &[(usize, Column)]) -> Result<AccidentRecord, String> {
    let mut record = AccidentRecord::default();

    for &(index, column) in layout {
        let value = row.get(index).unwrap_or_default();
        if value.is_empty() {
            return Err(format!("missing value for {}", column));
        }

        match column {
            Column::RoadCondition => record.road_condition = Some(value.to_string()),
            Column::RoadType => record.road_type = Some(value.to_string()),
            Column::AccidentSeverity => record.accident_severity = Some(value.to_string()),
            Column::Weather => record.weather = Some(value.to_string()),
            Column::TimeOfDay => record.time_of_day = Some(value.parse()?),
            Column::WearingHelmet => {
                let wearing = parse_helmet(value)
                    .ok_or_else(|| format!("invalid helmet value {:?}", value))?;
                record.wearing_helmet = Some(wearing);
            }
            Column::BikerAge => record.biker_age = Some(parse_measure(value, column)?),
            Column::BikeSpeed => record.bike_speed = Some(parse_measure(value, column)?),
            Column::TrafficDensity => record.traffic_density = Some(parse_measure(value, column)?),
            Column::NumberOfVehicles => {
                let count = parse_measure(value, column)?;
                if count.fract() != 0.0 || count > f64::from(u32::MAX) {
                    return Err(format!("{} must be a whole number, got {:?}", column, value));
                }
                record.number_of_vehicles = Some(count as u32);
            }
        }
    }

    Ok(record)
}

/// Parse a finite, non-negative number.
fn parse_measure(value: &str, column: Column) -> Result<f64, String> {
    let number: f64 = value
        .parse()
        .map_err(|_| format!("{} is not a number: {:?}", column, value))?;

    if !number.is_finite() || number < 0.0 {
        return Err(format!("{} must be non-negative, got {:?}", column, value));
    }

    Ok(number)
}

/// Fetch a remote CSV, retrying failed attempts.
async fn fetch(url: &str, options: &LoadOptions) -> Result<Vec<u8>, LoadError> {
    let attempts = options.retries + 1;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()
        .map_err(|source| LoadError::Unreachable {
            url: url.to_string(),
            attempts: 0,
            source,
        })?;

    let spinner = download_spinner(url, options.show_progress);

    let mut attempt = 1;
    let result = loop {
        match fetch_once(&client, url).await {
            Ok(body) => {
                debug!("Fetched {} bytes from {}", body.len(), url);
                break Ok(body);
            }
            Err(source) if attempt >= attempts => {
                break Err(LoadError::Unreachable {
                    url: url.to_string(),
                    attempts,
                    source,
                });
            }
            Err(e) => {
                warn!("Attempt {}/{} to fetch {} failed: {}", attempt, attempts, url, e);
                attempt += 1;
            }
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

fn download_spinner(url: &str, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("Downloading {}", url));
    pb.enable_steady_tick(Duration::from_millis(100));

    Some(pb)
}
