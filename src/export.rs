/// JSON export of a regularized study.
///
/// The document carries the shared axes once and every variable as a flat
/// row-major array with its shape. Missing values are written as `null`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::logging::{self, Stage};
use crate::model::{Layout, PrepError};
use crate::pipeline::RegularizedSeries;

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    /// First grid point, ISO 8601.
    start: String,
    locations: &'a [String],
    categories: &'a [String],
    time: &'a [f64],
    variables: BTreeMap<&'a str, VariableEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct VariableEntry<'a> {
    description: &'a str,
    layout: Layout,
    shape: &'a [usize],
    data: &'a [f64],
}

fn document(series: &RegularizedSeries) -> ExportDocument<'_> {
    let variables = series
        .variables
        .iter()
        .map(|v| {
            let entry = VariableEntry {
                description: &v.description,
                layout: v.tensor.layout,
                shape: &v.tensor.shape,
                data: &v.tensor.data,
            };
            (v.tensor.name.as_str(), entry)
        })
        .collect();

    ExportDocument {
        start: series.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        locations: &series.locations,
        categories: &series.categories,
        time: &series.time,
        variables,
    }
}

/// Serializes the study to a JSON string.
pub fn to_json(series: &RegularizedSeries) -> Result<String, PrepError> {
    Ok(serde_json::to_string(&document(series))?)
}

/// Writes the study as JSON, creating parent directories as needed.
pub fn write_json(series: &RegularizedSeries, path: impl AsRef<Path>) -> Result<(), PrepError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PrepError::Io(format!("{}: {}", parent.display(), e)))?;
    }
    let json = to_json(series)?;
    fs::write(path, json).map_err(|e| PrepError::Io(format!("{}: {}", path.display(), e)))?;

    logging::info(
        Stage::Export,
        None,
        &format!("Wrote {} variables to {}", series.variables.len(), path.display()),
    );
    Ok(())
}
