/// Comma-separated table reader
///
/// Reads the CSV exports of the monitoring spreadsheets. The first row is
/// the header and blank rows are ignored. The configured time column is
/// required, location and category columns are optional label columns, and
/// every other column is a numeric measurement.
///
/// Cell handling:
/// - `null`, empty or non-numeric measurement cells become `None`
/// - rows whose timestamp cannot be parsed are skipped with a warning
/// - short rows are padded with missing cells
///
/// Rows are split by the `csv` crate, so quoted cells may contain commas.
/// A leading byte order mark is dropped.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs;

use crate::config::DatasetConfig;
use crate::logging::{self, log_ingest_summary, Stage};
use crate::model::{Dataset, PrepError};

/// Accepted date-time layouts, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts; the sample is placed at midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

// ============================================================================
// Cell parsing
// ============================================================================

fn clean(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
}

/// Parses a numeric cell. `null`, empty and non-numeric cells are `None`.
pub fn parse_field(cell: &str) -> Option<f64> {
    let cell = clean(cell);
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
        return None;
    }
    cell.parse().ok()
}

/// Parses a timestamp cell in any of the accepted layouts.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = clean(cell);
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ============================================================================
// Table parsing
// ============================================================================

fn column_index(headers: &[String], dataset: &str, name: &str) -> Result<usize, PrepError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PrepError::MissingColumn {
            dataset: dataset.to_string(),
            column: name.to_string(),
        })
}

fn missing_header(config: &DatasetConfig, reason: String) -> PrepError {
    PrepError::Parse {
        source: config.name.clone(),
        line: 1,
        reason,
    }
}

/// Parses CSV text into a dataset described by `config`.
///
/// Fails if the header is missing or lacks a configured label column.
pub fn parse_table(text: &str, config: &DatasetConfig) -> Result<Dataset, PrepError> {
    // Excel "CSV UTF-8" exports start with a byte order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| missing_header(config, e.to_string()))?
        .iter()
        .map(|h| clean(h).to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(missing_header(config, "missing header row".to_string()));
    }

    let time_idx = column_index(&headers, &config.name, &config.time_column)?;
    let location_idx = config
        .location_column
        .as_deref()
        .map(|name| column_index(&headers, &config.name, name))
        .transpose()?;
    let category_idx = config
        .category_column
        .as_deref()
        .map(|name| column_index(&headers, &config.name, name))
        .transpose()?;

    let measure_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != time_idx && Some(i) != location_idx && Some(i) != category_idx)
        .collect();

    let mut dataset = Dataset {
        name: config.name.clone(),
        locations: location_idx.map(|_| Vec::new()),
        categories: category_idx.map(|_| Vec::new()),
        ..Dataset::default()
    };
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); measure_idx.len()];
    let mut skipped = 0;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                logging::warn(Stage::Ingest, Some(&config.name), &format!("{}, row skipped", e));
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let line_no = record.position().map_or(0, |p| p.line());
        let cell = |i: usize| record.get(i).unwrap_or("");

        let Some(timestamp) = parse_timestamp(cell(time_idx)) else {
            logging::warn(
                Stage::Ingest,
                Some(&config.name),
                &format!("line {}: unparseable timestamp '{}', row skipped", line_no, cell(time_idx)),
            );
            skipped += 1;
            continue;
        };

        dataset.timestamps.push(timestamp);
        if let (Some(idx), Some(locs)) = (location_idx, dataset.locations.as_mut()) {
            locs.push(clean(cell(idx)).to_string());
        }
        if let (Some(idx), Some(cats)) = (category_idx, dataset.categories.as_mut()) {
            cats.push(clean(cell(idx)).to_string());
        }
        for (values, &idx) in columns.iter_mut().zip(&measure_idx) {
            values.push(parse_field(cell(idx)));
        }
    }

    for (values, &idx) in columns.into_iter().zip(&measure_idx) {
        dataset.columns.insert(headers[idx].clone(), values);
    }

    log_ingest_summary(&config.name, dataset.len(), skipped);
    Ok(dataset)
}

/// Reads and parses the file named by `config.path`.
pub fn load_dataset(config: &DatasetConfig) -> Result<Dataset, PrepError> {
    let text = fs::read_to_string(&config.path)
        .map_err(|e| PrepError::Io(format!("{}: {}", config.path, e)))?;
    parse_table(&text, config)
}

/// Loads every configured dataset, keyed by name.
pub fn load_datasets(configs: &[DatasetConfig]) -> Result<BTreeMap<String, Dataset>, PrepError> {
    let mut datasets = BTreeMap::new();
    for config in configs {
        logging::debug(Stage::Ingest, Some(&config.name), &format!("reading {}", config.path));
        datasets.insert(config.name.clone(), load_dataset(config)?);
    }
    Ok(datasets)
}

// ============================================================================
// Tests
// ============================================================================
