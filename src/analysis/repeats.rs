//! Stale-hold suppression for density-style variables.
//!
//! When a single algae count is step-held across many days the column shows
//! long runs of exactly identical values. Only the first day of each run is
//! real; the rest are marked missing.

/// Replaces the second and later points of every run of identical
/// consecutive values with `NaN`. Returns how many points were cleared.
///
/// Runs are judged on the incoming values, so a missing point ends a run.
pub fn suppress_repeats(column: &mut [f64]) -> usize {
    let mut cleared = 0;
    let mut previous = f64::NAN;
    for value in column.iter_mut() {
        let current = *value;
        if !current.is_nan() && current == previous {
            *value = f64::NAN;
            cleared += 1;
        }
        previous = current;
    }
    cleared
}
