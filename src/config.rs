//! Study configuration loaded from TOML.
//!
//! A config names the input datasets and their label columns, the daily
//! grid, the boundary years scanned for seasonal gaps, logging and the
//! output path. Variables default to the built-in catalogue unless
//! `[[variable]]` tables are given.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::analysis::builder::{SampleThresholds, MIN_CATEGORY_SAMPLES, MIN_LOCATION_SAMPLES};
use crate::calendar::DenseGrid;
use crate::logging::LogLevel;
use crate::model::{BoundaryYears, Method, PrepError, Transform};
use crate::sites::default_locations;
use crate::variables::{default_specs, VariableSpec};

// ============================================================================
// Config sections
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    /// Location axis, in output order.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default)]
    pub grid: GridConfig,
    /// Defaults to the first and last calendar years of the grid.
    pub boundaries: Option<BoundaryConfig>,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "dataset")]
    pub datasets: Vec<DatasetConfig>,
    #[serde(default, rename = "variable")]
    pub variables: Vec<VariableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// First grid point, e.g. "2013-01-01T12:00:00".
    #[serde(default = "default_grid_start")]
    pub start: NaiveDateTime,
    /// Daily increments after `start`.
    #[serde(default = "default_grid_steps")]
    pub steps: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            start: default_grid_start(),
            steps: default_grid_steps(),
        }
    }
}

fn default_grid_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2013, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

fn default_grid_steps() -> usize {
    2200
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundaryConfig {
    pub first_year: i32,
    /// Exclusive.
    pub end_year: i32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_location_threshold")]
    pub location: usize,
    #[serde(default = "default_category_threshold")]
    pub category: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            location: MIN_LOCATION_SAMPLES,
            category: MIN_CATEGORY_SAMPLES,
        }
    }
}

fn default_location_threshold() -> usize {
    MIN_LOCATION_SAMPLES
}

fn default_category_threshold() -> usize {
    MIN_CATEGORY_SAMPLES
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    pub file: Option<String>,
    #[serde(default)]
    pub timestamps: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { path: default_output_path() }
    }
}

fn default_output_path() -> String {
    "Data/Preprocessed/Data_hist_interp.json".to_string()
}

/// One delimited input table.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub path: String,
    pub time_column: String,
    pub location_column: Option<String>,
    pub category_column: Option<String>,
}

/// A `[[variable]]` table replacing the built-in catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub dataset: String,
    pub column: String,
    #[serde(default)]
    pub transform: Transform,
    /// "step", "mean", "max" or "min".
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_true")]
    pub seasonal_mask: bool,
    #[serde(default)]
    pub suppress_repeats: bool,
}

fn default_method() -> String {
    "step".to_string()
}

fn default_true() -> bool {
    true
}

impl VariableConfig {
    pub fn to_spec(&self) -> Result<VariableSpec, PrepError> {
        let method: Method = self.method.parse()?;
        Ok(VariableSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            dataset: self.dataset.clone(),
            column: self.column.clone(),
            transform: self.transform,
            method,
            seasonal_mask: self.seasonal_mask,
            suppress_repeats: self.suppress_repeats,
        })
    }
}

// ============================================================================
// Derived values
// ============================================================================

impl StudyConfig {
    pub fn grid(&self) -> DenseGrid {
        DenseGrid::daily(self.grid.start, self.grid.steps)
    }

    pub fn boundary_years(&self, grid: &DenseGrid) -> BoundaryYears {
        match self.boundaries {
            Some(b) => BoundaryYears { first: b.first_year, end: b.end_year },
            None => grid.boundary_years(),
        }
    }

    pub fn sample_thresholds(&self) -> SampleThresholds {
        SampleThresholds {
            location: self.thresholds.location,
            category: self.thresholds.category,
        }
    }

    /// Configured variables, or the built-in catalogue when none are given.
    pub fn variable_specs(&self) -> Result<Vec<VariableSpec>, PrepError> {
        if self.variables.is_empty() {
            return Ok(default_specs());
        }
        self.variables.iter().map(VariableConfig::to_spec).collect()
    }

    pub fn find_dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// Checks internal consistency. Called by [`parse_config`].
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.locations.is_empty() {
            return Err(PrepError::Config("at least one location is required".to_string()));
        }
        let mut seen = HashSet::new();
        for loc in &self.locations {
            if !seen.insert(loc.as_str()) {
                return Err(PrepError::Config(format!("duplicate location '{}'", loc)));
            }
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.name.as_str()) {
                return Err(PrepError::Config(format!("duplicate dataset '{}'", dataset.name)));
            }
            if dataset.category_column.is_some() && dataset.location_column.is_none() {
                return Err(PrepError::Config(format!(
                    "dataset '{}' has a category column but no location column",
                    dataset.name
                )));
            }
        }

        if let Some(b) = self.boundaries {
            if b.first_year > b.end_year {
                return Err(PrepError::Config(format!(
                    "boundary first_year {} is after end_year {}",
                    b.first_year, b.end_year
                )));
            }
        }

        let mut seen = HashSet::new();
        for var in &self.variables {
            var.to_spec()?;
            if !seen.insert(var.name.as_str()) {
                return Err(PrepError::Config(format!("duplicate variable '{}'", var.name)));
            }
            if self.find_dataset(&var.dataset).is_none() {
                return Err(PrepError::UnknownDataset(var.dataset.clone()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Parses and validates a study config from TOML text.
pub fn parse_config(text: &str) -> Result<StudyConfig, PrepError> {
    let config: StudyConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a study config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<StudyConfig, PrepError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| PrepError::Io(format!("{}: {}", path.display(), e)))?;
    parse_config(&text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReduceMode;

    #[test]
    fn test_empty_config_uses_study_defaults() {
        let config = parse_config("").expect("empty config should parse");
        assert_eq!(config.locations, default_locations());
        assert_eq!(config.grid.steps, 2200);
        assert_eq!(config.grid.start.to_string(), "2013-01-01 12:00:00");
        assert_eq!(config.sample_thresholds(), SampleThresholds::default());
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.variable_specs().unwrap().len(), 17);

        let grid = config.grid();
        assert_eq!(config.boundary_years(&grid), BoundaryYears { first: 2013, end: 2019 });
    }

    #[test]
    fn test_explicit_sections_override_defaults() {
        let text = r#"
            locations = ["LB", "HA"]

            [grid]
            start = "2015-03-01T12:00:00"
            steps = 30

            [boundaries]
            first_year = 2014
            end_year = 2016

            [logging]
            level = "debug"
            timestamps = true

            [[dataset]]
            name = "nutrients"
            path = "nutrients.csv"
            time_column = "Date"
            location_column = "Site"

            [[variable]]
            name = "TP"
            dataset = "nutrients"
            column = "T-Phos (mg/L)"
            transform = "ln"
            method = "max"
        "#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.locations, vec!["LB", "HA"]);
        assert_eq!(config.grid().len(), 31);
        let grid = config.grid();
        assert_eq!(config.boundary_years(&grid), BoundaryYears { first: 2014, end: 2016 });
        assert_eq!(config.logging.level, LogLevel::Debug);

        let specs = config.variable_specs().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].transform, Transform::Ln);
        assert_eq!(specs[0].method, Method::Aggregate(ReduceMode::Max));
        assert!(specs[0].seasonal_mask);
        assert!(!specs[0].suppress_repeats);
    }

    #[test]
    fn test_unknown_method_fails_at_load() {
        let text = r#"
            [[dataset]]
            name = "nutrients"
            path = "nutrients.csv"
            time_column = "Date"

            [[variable]]
            name = "TP"
            dataset = "nutrients"
            column = "T-Phos (mg/L)"
            method = "median"
        "#;
        let err = parse_config(text).unwrap_err();
        assert_eq!(err, PrepError::UnsupportedReduction("median".to_string()));
    }

    #[test]
    fn test_variable_with_unknown_dataset_is_rejected() {
        let text = r#"
            [[variable]]
            name = "TP"
            dataset = "nowhere"
            column = "x"
        "#;
        assert_eq!(
            parse_config(text).unwrap_err(),
            PrepError::UnknownDataset("nowhere".to_string())
        );
    }

    #[test]
    fn test_duplicate_locations_are_rejected() {
        let err = parse_config(r#"locations = ["BB", "BB"]"#).unwrap_err();
        assert!(matches!(err, PrepError::Config(_)));
    }

    #[test]
    fn test_category_without_location_is_rejected() {
        let text = r#"
            [[dataset]]
            name = "algae"
            path = "algae.csv"
            time_column = "Date"
            category_column = "Division"
        "#;
        assert!(matches!(parse_config(text), Err(PrepError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(parse_config("locations = ["), Err(PrepError::Config(_))));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = parse_config(include_str!("../lakeprep.toml"))
            .expect("lakeprep.toml should be a valid study config");
        assert_eq!(config.datasets.len(), 5);
        for spec in config.variable_specs().unwrap() {
            assert!(
                config.find_dataset(&spec.dataset).is_some(),
                "variable '{}' refers to unconfigured dataset '{}'",
                spec.name,
                spec.dataset
            );
        }
    }
}
