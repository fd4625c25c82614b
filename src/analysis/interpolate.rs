//! Step ("previous") interpolation of a sparse series onto the dense grid.
//!
//! Each grid point takes the value of the most recent sample at or before
//! it. Nothing is extrapolated backwards; after the last sample the value
//! keeps being held until the seasonal cleaner masks it.

use crate::model::{Sample, SparseSeries};

/// A series needs strictly more samples than this to be interpolated.
pub const MIN_STEP_SAMPLES: usize = 3;

/// Interpolates `series` onto `grid`.
///
/// Returns one value per grid point, `NaN` where no prior sample exists.
/// If the series holds `min_samples` samples or fewer, every point is `NaN`.
/// Samples sharing a timestamp resolve to the last-listed one.
pub fn step_interpolate(series: &SparseSeries, grid: &[f64], min_samples: usize) -> Vec<f64> {
    if series.len() <= min_samples {
        return vec![f64::NAN; grid.len()];
    }

    let sorted = sorted_samples(series);
    grid.iter()
        .map(|&g| {
            let idx = sorted.partition_point(|s| s.time <= g);
            if idx == 0 { f64::NAN } else { sorted[idx - 1].value }
        })
        .collect()
}

/// Samples with a finite time, stably sorted so equal times keep listing order.
pub(crate) fn sorted_samples(series: &SparseSeries) -> Vec<Sample> {
    let mut sorted: Vec<Sample> = series
        .samples
        .iter()
        .copied()
        .filter(|s| s.time.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    sorted
}
