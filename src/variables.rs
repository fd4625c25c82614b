/// Catalogue of the regularized output variables.
///
/// Each entry says which dataset and measurement column a variable comes
/// from, how raw values are transformed, how the sparse series is filled
/// onto the grid, and which cleaning passes apply. The study config may
/// replace this catalogue wholesale with `[[variable]]` tables.

use crate::model::{Method, Transform};

// ---------------------------------------------------------------------------
// Dataset names
// ---------------------------------------------------------------------------

pub const DATASET_NUTRIENTS: &str = "nutrients";
pub const DATASET_LCMSMS: &str = "toxins_lcmsms";
pub const DATASET_ELISA: &str = "toxins_elisa";
pub const DATASET_ALGAE: &str = "algae";
pub const DATASET_WEATHER: &str = "weather";

// ---------------------------------------------------------------------------
// Variable definitions
// ---------------------------------------------------------------------------

/// Static catalogue entry.
pub struct VariableDef {
    /// Name of the output tensor.
    pub name: &'static str,
    pub description: &'static str,
    pub dataset: &'static str,
    /// Header of the measurement column in the dataset.
    pub column: &'static str,
    pub transform: Transform,
    pub method: Method,
    /// Mask step-held values across unsampled year boundaries.
    pub seasonal_mask: bool,
    /// Clear repeated identical values left by holding a single count.
    pub suppress_repeats: bool,
}

/// Owned variable description used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub description: String,
    pub dataset: String,
    pub column: String,
    pub transform: Transform,
    pub method: Method,
    pub seasonal_mask: bool,
    pub suppress_repeats: bool,
}

impl VariableDef {
    pub fn to_spec(&self) -> VariableSpec {
        VariableSpec {
            name: self.name.to_string(),
            description: self.description.to_string(),
            dataset: self.dataset.to_string(),
            column: self.column.to_string(),
            transform: self.transform,
            method: self.method,
            seasonal_mask: self.seasonal_mask,
            suppress_repeats: self.suppress_repeats,
        }
    }
}

const fn concentration(
    name: &'static str,
    description: &'static str,
    dataset: &'static str,
    column: &'static str,
) -> VariableDef {
    VariableDef {
        name,
        description,
        dataset,
        column,
        transform: Transform::Ln,
        method: Method::Step,
        seasonal_mask: true,
        suppress_repeats: false,
    }
}

const fn held_count(
    name: &'static str,
    description: &'static str,
    dataset: &'static str,
    column: &'static str,
) -> VariableDef {
    VariableDef {
        name,
        description,
        dataset,
        column,
        transform: Transform::None,
        method: Method::Step,
        seasonal_mask: true,
        suppress_repeats: true,
    }
}

/// Default output variables, in output order.
///
/// Nutrient and toxin concentrations are log-compressed; algae speciation
/// and weather keep raw units but drop stale repeats.
pub static VARIABLE_REGISTRY: &[VariableDef] = &[
    concentration("NUT1", "NO3+NO2 (mg/L)", DATASET_NUTRIENTS, "NO3+NO2 (mg/L)"),
    concentration("NUT2", "O-Phos (mg/L)", DATASET_NUTRIENTS, "O-Phos (mg/L)"),
    concentration("NUT3", "TN (mg/L)", DATASET_NUTRIENTS, "TN (mg/L)"),
    concentration("NUT4", "T-Phos (mg/L)", DATASET_NUTRIENTS, "T-Phos (mg/L)"),
    concentration("TOX1", "LC-MS/MS cylindrospermopsin (ppb)", DATASET_LCMSMS, "Cylindro (ppb)"),
    concentration("TOX2", "LC-MS/MS microcystin (ppb)", DATASET_LCMSMS, "Microcystin (ppb)"),
    concentration("TOX3", "ELISA cylindrospermopsin (ppb)", DATASET_ELISA, "Cylindro (ppb)"),
    concentration("TOX4", "ELISA microcystin (ppb)", DATASET_ELISA, "Microcystin (ppb)"),
    held_count("DEN", "Algal concentration per division", DATASET_ALGAE, "Density"),
    held_count("TBV", "Total biovolume per division", DATASET_ALGAE, "Tot Biovolume"),
    held_count("FBV", "Fractional biovolume per division", DATASET_ALGAE, "% Biovolume"),
    held_count("TEMP", "Air temperature", DATASET_WEATHER, "Temperature"),
    held_count("HUM", "Relative humidity", DATASET_WEATHER, "Humidity"),
    held_count("PWI", "Peak wind speed", DATASET_WEATHER, "Peak Wind"),
    held_count("WIS", "Wind speed", DATASET_WEATHER, "Wind Speed"),
    held_count("RAIN", "Rain", DATASET_WEATHER, "Rain"),
    held_count("PRES", "Barometric pressure", DATASET_WEATHER, "Pressure"),
];

/// Looks up a catalogue entry by output name.
pub fn find_variable(name: &str) -> Option<&'static VariableDef> {
    VARIABLE_REGISTRY.iter().find(|v| v.name == name)
}

/// The whole catalogue as owned specs.
pub fn default_specs() -> Vec<VariableSpec> {
    VARIABLE_REGISTRY.iter().map(VariableDef::to_spec).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
