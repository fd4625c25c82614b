/// Whole-study regularization run.
///
/// Builds the dense grid once, resolves the location and category axes,
/// then turns every configured variable into an output tensor. Variables
/// are independent of each other.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::builder::{build_variable, Axes, BuildStats};
use crate::config::StudyConfig;
use crate::logging::{self, log_variable_summary, Stage};
use crate::model::{Dataset, OutputTensor, PrepError};
use crate::sites::site_index;

/// One regularized variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableOutput {
    pub description: String,
    pub tensor: OutputTensor,
    pub stats: BuildStats,
}

/// Every variable of a study on a shared time, location and category axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularizedSeries {
    pub start: NaiveDateTime,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    /// Decimal-year grid.
    pub time: Vec<f64>,
    pub variables: Vec<VariableOutput>,
}

impl RegularizedSeries {
    pub fn variable(&self, name: &str) -> Option<&OutputTensor> {
        self.variables
            .iter()
            .map(|v| &v.tensor)
            .find(|t| t.name == name)
    }
}

/// Sorted union of the category labels of every category-keyed dataset.
pub fn collect_categories<'a>(datasets: impl IntoIterator<Item = &'a Dataset>) -> Vec<String> {
    datasets
        .into_iter()
        .flat_map(Dataset::distinct_categories)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Regularizes every variable of the study.
///
/// Fails if a variable names a dataset absent from `datasets` or a column
/// absent from its dataset.
pub fn run(
    config: &StudyConfig,
    datasets: &BTreeMap<String, Dataset>,
) -> Result<RegularizedSeries, PrepError> {
    let grid = config.grid();
    let boundaries = config.boundary_years(&grid);
    logging::info(
        Stage::Grid,
        None,
        &format!(
            "{} daily points from {}, seasonal boundaries {}..{}",
            grid.len(),
            grid.start(),
            boundaries.first,
            boundaries.end
        ),
    );

    let locations = config.locations.clone();
    for loc in &locations {
        if site_index(loc).is_none() {
            logging::debug(Stage::Grid, Some(loc.as_str()), "location is not a registered study site");
        }
    }
    let categories = collect_categories(datasets.values());
    let axes = Axes {
        locations: &locations,
        categories: &categories,
    };
    let thresholds = config.sample_thresholds();

    let specs = config.variable_specs()?;
    let mut variables = Vec::with_capacity(specs.len());
    for spec in &specs {
        let dataset = datasets
            .get(&spec.dataset)
            .ok_or_else(|| PrepError::UnknownDataset(spec.dataset.clone()))?;
        let (tensor, stats) = build_variable(dataset, spec, axes, &grid, boundaries, thresholds)?;

        log_variable_summary(&spec.name, tensor.filled_cells(), tensor.data.len(), stats.masked);
        if stats.repeats > 0 {
            logging::debug(
                Stage::Series,
                Some(&spec.name),
                &format!("{} repeated values cleared", stats.repeats),
            );
        }
        variables.push(VariableOutput {
            description: spec.description.clone(),
            tensor,
            stats,
        });
    }

    Ok(RegularizedSeries {
        start: grid.start(),
        locations,
        categories,
        time: grid.times().to_vec(),
        variables,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::model::Layout;
    use chrono::NaiveDate;

    const CONFIG: &str = r#"
        locations = ["LB", "HA"]

        [grid]
        start = "2014-06-01T12:00:00"
        steps = 60

        [[dataset]]
        name = "algae"
        path = "algae.csv"
        time_column = "Date"
        location_column = "Site"
        category_column = "Division"

        [[variable]]
        name = "DEN"
        dataset = "algae"
        column = "Density"
        suppress_repeats = true
    "#;

    fn at(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn algae() -> Dataset {
        let rows = [
            (at(6, 2), "LB", "Cyanophyta", 100.0),
            (at(6, 9), "LB", "Cyanophyta", 150.0),
            (at(6, 16), "LB", "Chlorophyta", 20.0),
            (at(6, 23), "LB", "Chlorophyta", 30.0),
            (at(6, 30), "LB", "Cyanophyta", 90.0),
            (at(6, 2), "HA", "Diatoms", 5.0),
        ];
        let mut columns = BTreeMap::new();
        columns.insert("Density".to_string(), rows.iter().map(|r| Some(r.3)).collect());
        Dataset {
            name: "algae".to_string(),
            timestamps: rows.iter().map(|r| r.0).collect(),
            locations: Some(rows.iter().map(|r| r.1.to_string()).collect()),
            categories: Some(rows.iter().map(|r| r.2.to_string()).collect()),
            columns,
        }
    }

    #[test]
    fn test_collect_categories_is_sorted_union() {
        let unkeyed = Dataset {
            name: "weather".to_string(),
            ..Dataset::default()
        };
        let cats = collect_categories([&algae(), &unkeyed]);
        assert_eq!(cats, vec!["Chlorophyta", "Cyanophyta", "Diatoms"]);
    }

    #[test]
    fn test_run_builds_keyed_tensor_on_shared_axes() {
        let config = parse_config(CONFIG).unwrap();
        let mut datasets = BTreeMap::new();
        datasets.insert("algae".to_string(), algae());

        let result = run(&config, &datasets).expect("run should succeed");
        assert_eq!(result.time.len(), 61);
        assert_eq!(result.locations, vec!["LB", "HA"]);
        assert_eq!(result.categories.len(), 3);

        let den = result.variable("DEN").expect("DEN should be built");
        assert_eq!(den.layout, Layout::ByLocationCategory);
        assert_eq!(den.shape, vec![61, 2, 3]);

        // LB has 5 rows, so each division with 2+ rows is filled.
        let cyano = den.column(0, 1);
        assert_eq!(cyano[1], 100.0, "2014-06-02 holds the first count");
        assert!(cyano[2].is_nan(), "repeat of the held count is cleared");
        assert_eq!(cyano[8], 150.0);

        // HA has a single row: the whole location stays missing.
        assert!((0..3).all(|c| den.column(1, c).iter().all(|v| v.is_nan())));
    }

    #[test]
    fn test_run_reports_unknown_dataset() {
        let config = parse_config(CONFIG).unwrap();
        let err = run(&config, &BTreeMap::new()).unwrap_err();
        assert_eq!(err, PrepError::UnknownDataset("algae".to_string()));
    }

    #[test]
    fn test_run_reports_missing_column() {
        let config = parse_config(CONFIG).unwrap();
        let mut ds = algae();
        ds.columns.clear();
        let mut datasets = BTreeMap::new();
        datasets.insert("algae".to_string(), ds);
        assert!(matches!(
            run(&config, &datasets),
            Err(PrepError::MissingColumn { .. })
        ));
    }
}
