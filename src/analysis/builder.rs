//! Series builder: turns one variable of a dataset into an output tensor.
//!
//! Every (location[, category]) slice is built independently by
//! [`build_column`], a pure function of its samples, the grid and the
//! boundary years.

use crate::analysis::gaps::seasonal_clean;
use crate::analysis::integrate::integrate;
use crate::analysis::interpolate::{step_interpolate, MIN_STEP_SAMPLES};
use crate::analysis::repeats::suppress_repeats;
use crate::calendar::DenseGrid;
use crate::logging::{self, series_key, Stage};
use crate::model::{BoundaryYears, Dataset, Layout, Method, OutputTensor, PrepError, Sample, SparseSeries};
use crate::variables::VariableSpec;

/// Rows at a location must exceed this count to be regularized.
pub const MIN_LOCATION_SAMPLES: usize = MIN_STEP_SAMPLES;

/// Rows at a (location, category) pair must exceed this count.
pub const MIN_CATEGORY_SAMPLES: usize = 1;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Sample-count gates applied before a slice is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleThresholds {
    pub location: usize,
    pub category: usize,
}

impl Default for SampleThresholds {
    fn default() -> Self {
        SampleThresholds {
            location: MIN_LOCATION_SAMPLES,
            category: MIN_CATEGORY_SAMPLES,
        }
    }
}

/// How a single column is filled and cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesOptions {
    pub method: Method,
    /// The series needs strictly more samples than this.
    pub min_samples: usize,
    pub seasonal_mask: bool,
    pub suppress_repeats: bool,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        SeriesOptions {
            method: Method::Step,
            min_samples: MIN_STEP_SAMPLES,
            seasonal_mask: true,
            suppress_repeats: false,
        }
    }
}

impl SeriesOptions {
    pub fn for_variable(spec: &VariableSpec, min_samples: usize) -> Self {
        SeriesOptions {
            method: spec.method,
            min_samples,
            seasonal_mask: spec.seasonal_mask,
            suppress_repeats: spec.suppress_repeats,
        }
    }
}

/// Labels of the non-time tensor axes.
#[derive(Debug, Clone, Copy)]
pub struct Axes<'a> {
    pub locations: &'a [String],
    pub categories: &'a [String],
}

/// Counters gathered while building one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Slices left all-missing because of the sample gates.
    pub skipped: usize,
    /// Values removed by the seasonal cleaner.
    pub masked: usize,
    /// Values removed by repeat suppression.
    pub repeats: usize,
}

impl BuildStats {
    fn absorb(&mut self, other: BuildStats) {
        self.skipped += other.skipped;
        self.masked += other.masked;
        self.repeats += other.repeats;
    }
}

// ---------------------------------------------------------------------------
// Single column
// ---------------------------------------------------------------------------

/// Fills one column of the grid from a sparse series, then cleans it.
pub fn build_column(
    series: &SparseSeries,
    grid: &DenseGrid,
    boundaries: BoundaryYears,
    options: &SeriesOptions,
) -> Vec<f64> {
    build_column_with_stats(series, grid, boundaries, options).0
}

fn build_column_with_stats(
    series: &SparseSeries,
    grid: &DenseGrid,
    boundaries: BoundaryYears,
    options: &SeriesOptions,
) -> (Vec<f64>, BuildStats) {
    let mut stats = BuildStats::default();
    if series.len() <= options.min_samples {
        stats.skipped = 1;
        return (vec![f64::NAN; grid.len()], stats);
    }

    let mut column = match options.method {
        Method::Step => step_interpolate(series, grid.times(), options.min_samples),
        Method::Aggregate(mode) => integrate(series, grid.times(), mode),
    };
    if options.seasonal_mask {
        stats.masked = seasonal_clean(&series.times(), &mut column, grid.times(), boundaries);
    }
    if options.suppress_repeats {
        stats.repeats = suppress_repeats(&mut column);
    }
    (column, stats)
}

// ---------------------------------------------------------------------------
// Whole variable
// ---------------------------------------------------------------------------

fn extract_series(times: &[f64], values: &[f64], rows: &[usize]) -> SparseSeries {
    SparseSeries::new(rows.iter().map(|&i| Sample::new(times[i], values[i])).collect())
}

/// Builds the output tensor of one variable.
///
/// Fails only when the variable's column is missing from the dataset;
/// sparse or empty slices are left all-missing.
pub fn build_variable(
    dataset: &Dataset,
    spec: &VariableSpec,
    axes: Axes<'_>,
    grid: &DenseGrid,
    boundaries: BoundaryYears,
    thresholds: SampleThresholds,
) -> Result<(OutputTensor, BuildStats), PrepError> {
    let raw = dataset.column(&spec.column)?;
    let values: Vec<f64> = raw.iter().map(|&v| spec.transform.apply(v)).collect();
    let times = dataset.decimal_times();

    let layout = dataset.layout();
    let mut tensor = OutputTensor::missing(
        &spec.name,
        layout,
        grid.len(),
        axes.locations.len(),
        axes.categories.len(),
    );
    let mut stats = BuildStats::default();
    let fill = |tensor: &mut OutputTensor, li: usize, ci: usize, rows: &[usize], min_samples: usize| {
        let series = extract_series(&times, &values, rows);
        let options = SeriesOptions::for_variable(spec, min_samples);
        let (column, s) = build_column_with_stats(&series, grid, boundaries, &options);
        tensor.write_column(li, ci, &column);
        s
    };

    match layout {
        Layout::Unkeyed => {
            let rows = dataset.rows_matching(None, None);
            if rows.len() <= thresholds.location {
                logging::debug(Stage::Series, Some(&spec.name), &format!("only {} samples, left missing", rows.len()));
                stats.skipped += 1;
            } else {
                stats.absorb(fill(&mut tensor, 0, 0, &rows, thresholds.location));
            }
        }
        Layout::ByLocation => {
            for (li, loc) in axes.locations.iter().enumerate() {
                let rows = dataset.rows_matching(Some(loc.as_str()), None);
                if rows.len() <= thresholds.location {
                    let key = series_key(&spec.name, Some(loc.as_str()), None);
                    logging::debug(Stage::Series, Some(&key), &format!("only {} samples, left missing", rows.len()));
                    stats.skipped += 1;
                    continue;
                }
                stats.absorb(fill(&mut tensor, li, 0, &rows, thresholds.location));
            }
        }
        Layout::ByLocationCategory => {
            for (li, loc) in axes.locations.iter().enumerate() {
                let at_location = dataset.rows_matching(Some(loc.as_str()), None).len();
                if at_location <= thresholds.location {
                    let key = series_key(&spec.name, Some(loc.as_str()), None);
                    logging::debug(Stage::Series, Some(&key), &format!("only {} samples, left missing", at_location));
                    stats.skipped += axes.categories.len();
                    continue;
                }
                for (ci, cat) in axes.categories.iter().enumerate() {
                    let rows = dataset.rows_matching(Some(loc.as_str()), Some(cat.as_str()));
                    if rows.len() <= thresholds.category {
                        stats.skipped += 1;
                        continue;
                    }
                    stats.absorb(fill(&mut tensor, li, ci, &rows, thresholds.category));
                }
            }
        }
    }

    Ok((tensor, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
