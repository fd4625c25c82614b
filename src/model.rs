/// Core data types for the lake monitoring preprocessor.
///
/// This module defines the shared domain model imported by all other modules:
/// input datasets, sparse samples, the output tensor, gap masks, reduction
/// modes and the crate-wide error type. It contains no I/O.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::calendar::date_to_decimal_year;

// ---------------------------------------------------------------------------
// Sparse input
// ---------------------------------------------------------------------------

/// A single field observation on the decimal-year time axis.
///
/// `value` is `NaN` when the source cell was missing or invalid. Such rows
/// still count toward sample thresholds and still take part in step hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Sample { time, value }
    }
}

/// All samples for one (variable, location[, category]) combination.
///
/// Neither sorted nor deduplicated by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseSeries {
    pub samples: Vec<Sample>,
}

impl SparseSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        SparseSeries { samples }
    }

    /// Builds a series from parallel `(time, value)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        SparseSeries {
            samples: pairs.iter().map(|&(t, v)| Sample::new(t, v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample times in listing order.
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }
}

/// Column-oriented table handed over by the reading collaborator.
///
/// One row per field sample. Measurement cells that were empty or
/// non-numeric are `None`; label cells that were empty are `""`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub locations: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Tensor layout implied by which label columns are present.
    pub fn layout(&self) -> Layout {
        match (&self.locations, &self.categories) {
            (Some(_), Some(_)) => Layout::ByLocationCategory,
            (Some(_), None) => Layout::ByLocation,
            _ => Layout::Unkeyed,
        }
    }

    pub fn decimal_times(&self) -> Vec<f64> {
        self.timestamps.iter().map(|&t| date_to_decimal_year(t)).collect()
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>], PrepError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PrepError::MissingColumn {
                dataset: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Sorted distinct category labels, empty labels excluded.
    pub fn distinct_categories(&self) -> Vec<String> {
        self.categories
            .iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Row indices at `location` (and `category`, when given).
    pub fn rows_matching(&self, location: Option<&str>, category: Option<&str>) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| match (location, &self.locations) {
                (Some(loc), Some(locs)) => locs[i] == loc,
                _ => true,
            })
            .filter(|&i| match (category, &self.categories) {
                (Some(cat), Some(cats)) => cats[i] == cat,
                _ => true,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Gap masks
// ---------------------------------------------------------------------------

/// An open interval `(start, end)` of the dense grid that must be reported
/// as missing. Both endpoints sit on a day midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapMask {
    pub start: f64,
    pub end: f64,
}

impl GapMask {
    /// Strict on both ends: the quantized endpoints themselves keep their values.
    pub fn contains(&self, t: f64) -> bool {
        self.start < t && t < self.end
    }
}

/// Half-open range of boundary years scanned by the seasonal cleaner.
///
/// `first = 2013, end = 2019` tests the crossings 2013→2014 through 2018→2019.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryYears {
    pub first: i32,
    pub end: i32,
}

// ---------------------------------------------------------------------------
// Fill methods
// ---------------------------------------------------------------------------

/// Reducer applied by the aggregating integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceMode {
    Mean,
    Max,
    Min,
}

impl FromStr for ReduceMode {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ReduceMode::Mean),
            "max" => Ok(ReduceMode::Max),
            "min" => Ok(ReduceMode::Min),
            _ => Err(PrepError::UnsupportedReduction(s.to_string())),
        }
    }
}

/// How a sparse series is projected onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Hold the most recent prior sample ("previous" interpolation).
    Step,
    /// Reduce the samples falling in each one-sided grid bin.
    Aggregate(ReduceMode),
}

impl FromStr for Method {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "step" | "previous" => Ok(Method::Step),
            other => other.parse().map(Method::Aggregate).map_err(|_| {
                PrepError::UnsupportedReduction(s.to_string())
            }),
        }
    }
}

/// Value transform applied before interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    #[default]
    None,
    /// Natural log; non-positive or missing values become missing.
    Ln,
}

impl Transform {
    pub fn apply(&self, value: Option<f64>) -> f64 {
        match (self, value) {
            (_, None) => f64::NAN,
            (Transform::None, Some(v)) => v,
            (Transform::Ln, Some(v)) if v > 0.0 => v.ln(),
            (Transform::Ln, Some(_)) => f64::NAN,
        }
    }
}

// ---------------------------------------------------------------------------
// Output tensors
// ---------------------------------------------------------------------------

/// Axis layout of an output tensor, after the leading time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One series for the whole lake (weather station).
    Unkeyed,
    ByLocation,
    ByLocationCategory,
}

/// Dense row-major array of shape `(time[, location[, category]])`.
///
/// Missing and masked cells are `NaN`; serde_json writes them as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTensor {
    pub name: String,
    pub layout: Layout,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl OutputTensor {
    /// An all-missing tensor.
    pub fn missing(name: &str, layout: Layout, times: usize, locations: usize, categories: usize) -> Self {
        let shape = match layout {
            Layout::Unkeyed => vec![times],
            Layout::ByLocation => vec![times, locations],
            Layout::ByLocationCategory => vec![times, locations, categories],
        };
        let len = shape.iter().product();
        OutputTensor {
            name: name.to_string(),
            layout,
            shape,
            data: vec![f64::NAN; len],
        }
    }

    /// Distance between consecutive time steps in `data`.
    fn row_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    fn offset(&self, location: usize, category: usize) -> usize {
        match self.layout {
            Layout::Unkeyed => 0,
            Layout::ByLocation => location,
            Layout::ByLocationCategory => location * self.shape[2] + category,
        }
    }

    /// Value at `(time, location, category)`; unused indices are ignored.
    pub fn get(&self, time: usize, location: usize, category: usize) -> f64 {
        self.data[time * self.row_len() + self.offset(location, category)]
    }

    /// Copies `column` (one value per time step) into a slice of the tensor.
    pub fn write_column(&mut self, location: usize, category: usize, column: &[f64]) {
        let row = self.row_len();
        let offset = self.offset(location, category);
        for (t, &v) in column.iter().enumerate().take(self.shape[0]) {
            self.data[t * row + offset] = v;
        }
    }

    /// Extracts the time series at one slice.
    pub fn column(&self, location: usize, category: usize) -> Vec<f64> {
        (0..self.shape[0]).map(|t| self.get(t, location, category)).collect()
    }

    pub fn filled_cells(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while loading, regularizing or exporting data.
#[derive(Debug, PartialEq)]
pub enum PrepError {
    /// The aggregating integrator was asked for a reducer it does not know.
    UnsupportedReduction(String),
    /// A decimal year that cannot be mapped back to a calendar date.
    DateOutOfRange(f64),
    /// The study configuration is inconsistent or incomplete.
    Config(String),
    /// Reading or writing a file failed.
    Io(String),
    /// A row of a delimited input could not be interpreted at all.
    Parse { source: String, line: usize, reason: String },
    /// A variable refers to a measurement column its dataset lacks.
    MissingColumn { dataset: String, column: String },
    /// A variable refers to a dataset that was not loaded.
    UnknownDataset(String),
    /// The output document could not be serialized.
    Serialize(String),
}

impl std::fmt::Display for PrepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepError::UnsupportedReduction(mode) => {
                write!(f, "Unsupported reduction mode '{}' (expected mean, max or min)", mode)
            }
            PrepError::DateOutOfRange(value) => write!(f, "Decimal year out of range: {}", value),
            PrepError::Config(msg) => write!(f, "Config error: {}", msg),
            PrepError::Io(msg) => write!(f, "I/O error: {}", msg),
            PrepError::Parse { source, line, reason } => {
                write!(f, "Parse error in {} line {}: {}", source, line, reason)
            }
            PrepError::MissingColumn { dataset, column } => {
                write!(f, "Dataset '{}' has no column '{}'", dataset, column)
            }
            PrepError::UnknownDataset(name) => write!(f, "Unknown dataset: {}", name),
            PrepError::Serialize(msg) => write!(f, "Serialize error: {}", msg),
        }
    }
}

impl std::error::Error for PrepError {}

impl From<std::io::Error> for PrepError {
    fn from(err: std::io::Error) -> Self {
        PrepError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for PrepError {
    fn from(err: toml::de::Error) -> Self {
        PrepError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::Serialize(err.to_string())
    }
}
