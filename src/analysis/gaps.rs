//! Seasonal gap detection across year boundaries.
//!
//! Step hold assumes a value sampled in November is still valid the next
//! spring. When the lake was not sampled over winter that is a data gap, not
//! a signal. For every year boundary the series actually straddles, the
//! grid points between the day after the last sample before the boundary and
//! the day before the first sample after it are masked.

use crate::calendar::year_length;
use crate::model::{BoundaryYears, GapMask};

/// Snaps `t` (in `year`) to the midpoint of the day that follows it.
fn snap_after(t: f64, year: i32) -> f64 {
    let yl = year_length(year) as f64;
    let y = year as f64;
    (((t - y) * yl - 0.5).ceil() + 0.5) / yl + y
}

/// Snaps `t` (in `year`) to the midpoint of the day that precedes it.
fn snap_before(t: f64, year: i32) -> f64 {
    let yl = year_length(year) as f64;
    let y = year as f64;
    (((t - y) * yl - 0.5).floor() + 0.5) / yl + y
}

/// Computes the gap masks of one series.
///
/// Scans boundary years from `boundaries.first` up to `boundaries.end`
/// (exclusive). A crossing with no sample on one side produces no mask.
/// After a mask the scan resumes from the year of the next sample, so a
/// gap spanning several years yields a single mask.
pub fn detect_gaps(times: &[f64], boundaries: BoundaryYears) -> Vec<GapMask> {
    let mut masks = Vec::new();
    let mut year = boundaries.first;

    while year < boundaries.end {
        let edge = (year + 1) as f64;
        let last_before = times
            .iter()
            .copied()
            .filter(|&t| t < edge)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.max(t))));
        let first_after = times
            .iter()
            .copied()
            .filter(|&t| t >= edge)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.min(t))));

        match (last_before, first_after) {
            (Some(last), Some(next)) => {
                let next_year = next.floor() as i32;
                masks.push(GapMask {
                    start: snap_after(last, year),
                    end: snap_before(next, next_year),
                });
                year = next_year;
            }
            _ => year += 1,
        }
    }

    masks
}

/// Sets every masked grid point of `column` to `NaN`.
///
/// Returns how many finite values were removed.
pub fn apply_masks(grid: &[f64], column: &mut [f64], masks: &[GapMask]) -> usize {
    let mut removed = 0;
    for (&g, value) in grid.iter().zip(column.iter_mut()) {
        if masks.iter().any(|m| m.contains(g)) {
            if !value.is_nan() {
                removed += 1;
            }
            *value = f64::NAN;
        }
    }
    removed
}

/// Detects the gaps of a series and masks them out of its dense column.
pub fn seasonal_clean(times: &[f64], column: &mut [f64], grid: &[f64], boundaries: BoundaryYears) -> usize {
    let masks = detect_gaps(times, boundaries);
    apply_masks(grid, column, &masks)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::interpolate::step_interpolate;
    use crate::calendar::{date_to_decimal_year, DenseGrid};
    use crate::model::SparseSeries;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    const STUDY: BoundaryYears = BoundaryYears { first: 2013, end: 2019 };

    fn study_grid() -> DenseGrid {
        let start = NaiveDate::from_ymd_opt(2013, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        DenseGrid::daily(start, 2200)
    }

    fn day(y: i32, m: u32, d: u32, h: u32) -> f64 {
        date_to_decimal_year(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn test_snap_after_lands_on_following_midday() {
        // 2013-12-15 18:00 snaps to 2013-12-16 12:00.
        let snapped = snap_after(day(2013, 12, 15, 18), 2013);
        assert_abs_diff_eq!(snapped, day(2013, 12, 16, 12), epsilon = 1e-9);
    }

    #[test]
    fn test_snap_before_uses_day_count_of_sample_year() {
        // 2016-01-10 09:00 snaps to 2016-01-09 12:00 on a 366-day year.
        let snapped = snap_before(day(2016, 1, 10, 9), 2016);
        assert_abs_diff_eq!(snapped, day(2016, 1, 9, 12), epsilon = 1e-9);
    }

    #[test]
    fn test_no_samples_means_no_masks() {
        assert!(detect_gaps(&[], STUDY).is_empty());
    }

    #[test]
    fn test_samples_within_one_year_produce_no_mask() {
        let times = [2014.3, 2014.4, 2014.5, 2014.6];
        assert!(detect_gaps(&times, STUDY).is_empty());
    }

    #[test]
    fn test_multi_year_gap_is_one_mask() {
        let times = [2013.5, 2013.9, 2016.4, 2016.6];
        let masks = detect_gaps(&times, STUDY);
        assert_eq!(masks.len(), 1);
        assert!(masks[0].start > 2013.89 && masks[0].start < 2013.91);
        assert!(masks[0].end < 2016.4 && masks[0].end > 2016.39);
    }

    #[test]
    fn test_winter_gap_masks_between_last_and_next_sample() {
        let grid = study_grid();
        let series = SparseSeries::from_pairs(&[
            (2013.90, 1.0),
            (2013.95, 2.0),
            (2013.99, 3.0),
            (2014.95, 4.0),
            (2015.02, 5.0),
        ]);
        let mut column = step_interpolate(&series, grid.times(), 3);
        let unmasked = column.clone();
        seasonal_clean(&series.times(), &mut column, grid.times(), STUDY);

        let masks = detect_gaps(&series.times(), STUDY);
        assert_eq!(masks.len(), 2, "one mask per straddled boundary");
        assert_eq!(masks[0], GapMask { start: snap_after(2013.99, 2013), end: snap_before(2014.95, 2014) });
        assert_eq!(masks[1], GapMask { start: snap_after(2014.95, 2014), end: snap_before(2015.02, 2015) });

        for (i, &g) in grid.times().iter().enumerate() {
            if masks.iter().any(|m| m.contains(g)) {
                assert!(column[i].is_nan(), "grid point {} inside a gap should be masked", g);
            } else if unmasked[i].is_nan() {
                assert!(column[i].is_nan(), "grid point {} was missing before masking", g);
            } else {
                assert_eq!(column[i], unmasked[i], "grid point {} outside every gap changed", g);
            }
        }

        // Before the first gap the 2013 values are held.
        let idx = grid.times().iter().position(|&g| g > 2013.96).unwrap();
        assert_eq!(column[idx], 2.0);

        // After the short 2014/2015 gap the 2015 sample is held to the end.
        let after = grid.times().iter().position(|&g| g > masks[1].end).unwrap();
        assert!(grid.times()[after] >= 2015.02);
        assert_eq!(column[after], 5.0);
        assert_eq!(*column.last().unwrap(), 5.0);
        assert!(column[after..].iter().all(|&v| v == 5.0), "nothing after the last gap is masked");

        // Between the two gaps the 2014 sample survives on its own day.
        let held_2014: Vec<f64> = grid
            .times()
            .iter()
            .zip(&column)
            .filter(|(g, _)| **g >= 2014.95 && **g <= masks[1].start)
            .map(|(_, &v)| v)
            .collect();
        assert!(!held_2014.is_empty());
        assert!(held_2014.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_consecutive_days_across_boundary_mask_nothing() {
        let grid = study_grid();
        let series = SparseSeries::from_pairs(&[
            (day(2013, 12, 29, 8), 1.0),
            (day(2013, 12, 30, 8), 2.0),
            (day(2013, 12, 31, 8), 3.0),
            (day(2014, 1, 1, 8), 4.0),
            (day(2014, 1, 2, 8), 5.0),
        ]);
        let mut column = step_interpolate(&series, grid.times(), 3);
        let before = column.clone();
        let masks = detect_gaps(&series.times(), STUDY);
        assert_eq!(masks.len(), 1);

        let removed = apply_masks(grid.times(), &mut column, &masks);
        assert_eq!(removed, 0);
        for (a, b) in column.iter().zip(&before) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn test_apply_masks_counts_only_finite_values() {
        let grid = [1.0, 2.0, 3.0, 4.0];
        let mut column = [10.0, f64::NAN, 30.0, 40.0];
        let masks = [GapMask { start: 1.5, end: 3.5 }];
        assert_eq!(apply_masks(&grid, &mut column, &masks), 1);
        assert_eq!(column[0], 10.0);
        assert!(column[1].is_nan() && column[2].is_nan());
        assert_eq!(column[3], 40.0);
    }
}
