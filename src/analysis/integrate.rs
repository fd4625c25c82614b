//! Aggregating integrator: one-sided binning between grid points.
//!
//! An alternative to step interpolation for variables where several raw
//! samples can fall on the same day and a daily reduction is wanted instead
//! of the most recent value.

use crate::model::{PrepError, ReduceMode, SparseSeries};

/// Reduces the samples of each bin `[domain[k], domain[k + 1])`.
///
/// The bin of the last domain point is open-ended. Missing sample values are
/// skipped; a bin with no usable sample yields `NaN`.
pub fn integrate(series: &SparseSeries, domain: &[f64], mode: ReduceMode) -> Vec<f64> {
    (0..domain.len())
        .map(|k| {
            let lo = domain[k];
            let hi = domain.get(k + 1).copied().unwrap_or(f64::INFINITY);
            let values = series
                .samples
                .iter()
                .filter(|s| s.time >= lo && s.time < hi && !s.value.is_nan())
                .map(|s| s.value);
            reduce(values, mode)
        })
        .collect()
}

/// Same as [`integrate`], with the reducer given by name.
///
/// Fails fast with `UnsupportedReduction` for anything but mean, max or min.
pub fn integrate_named(series: &SparseSeries, domain: &[f64], mode: &str) -> Result<Vec<f64>, PrepError> {
    let mode: ReduceMode = mode.parse()?;
    Ok(integrate(series, domain, mode))
}

fn reduce(values: impl Iterator<Item = f64>, mode: ReduceMode) -> f64 {
    let mut count = 0usize;
    let mut acc = match mode {
        ReduceMode::Mean => 0.0,
        ReduceMode::Max => f64::NEG_INFINITY,
        ReduceMode::Min => f64::INFINITY,
    };
    for v in values {
        count += 1;
        acc = match mode {
            ReduceMode::Mean => acc + v,
            ReduceMode::Max => acc.max(v),
            ReduceMode::Min => acc.min(v),
        };
    }

    if count == 0 {
        return f64::NAN;
    }
    match mode {
        ReduceMode::Mean => acc / count as f64,
        ReduceMode::Max | ReduceMode::Min => acc,
    }
}
