/// Decimal-year calendar utilities and the shared daily grid.
///
/// A decimal year encodes a timestamp as `year + fraction`, where the
/// fraction is scaled by the exact day count of that year (365 or 366).
/// Every series in the preprocessor lives on this axis.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::model::{BoundaryYears, PrepError};

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Number of days between Jan 1 of `year` and Jan 1 of `year + 1`.
pub fn year_length(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Converts a calendar timestamp to a decimal year.
///
/// Jan 1 00:00:00 maps exactly to `year as f64`.
pub fn date_to_decimal_year(date: NaiveDateTime) -> f64 {
    let elapsed = date.ordinal0() as f64 * SECONDS_PER_DAY
        + date.num_seconds_from_midnight() as f64
        + date.nanosecond() as f64 * 1e-9;
    let year_seconds = year_length(date.year()) as f64 * SECONDS_PER_DAY;
    date.year() as f64 + elapsed / year_seconds
}

/// Inverse of [`date_to_decimal_year`], rounded to the millisecond.
///
/// Returns `DateOutOfRange` for non-finite input or years chrono cannot
/// represent.
pub fn decimal_year_to_date(value: f64) -> Result<NaiveDateTime, PrepError> {
    if !value.is_finite() {
        return Err(PrepError::DateOutOfRange(value));
    }
    let floor = value.floor();
    if floor < i32::MIN as f64 || floor > i32::MAX as f64 {
        return Err(PrepError::DateOutOfRange(value));
    }
    let year = floor as i32;
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or(PrepError::DateOutOfRange(value))?;

    let seconds = (value - floor) * year_length(year) as f64 * SECONDS_PER_DAY;
    let millis = (seconds * 1000.0).round() as i64;
    jan1.checked_add_signed(Duration::milliseconds(millis))
        .ok_or(PrepError::DateOutOfRange(value))
}

// ---------------------------------------------------------------------------
// Dense grid
// ---------------------------------------------------------------------------

/// The fixed daily time axis every variable is projected onto.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGrid {
    start: NaiveDateTime,
    times: Vec<f64>,
}

impl DenseGrid {
    /// `start` plus `steps` daily increments, so `steps + 1` points in total.
    pub fn daily(start: NaiveDateTime, steps: usize) -> Self {
        let times = (0..=steps)
            .map(|i| date_to_decimal_year(start + Duration::days(i as i64)))
            .collect();
        DenseGrid { start, times }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn first_year(&self) -> i32 {
        self.start.year()
    }

    /// Calendar year of the last grid point.
    pub fn last_year(&self) -> i32 {
        self.times
            .last()
            .map(|t| t.floor() as i32)
            .unwrap_or_else(|| self.first_year())
    }

    /// Boundary years spanning the grid: every crossing from the first
    /// year up to the one that ends in the last year.
    pub fn boundary_years(&self) -> BoundaryYears {
        BoundaryYears {
            first: self.first_year(),
            end: self.last_year(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_year_length_in_study_window() {
        for year in 2013..=2019 {
            let expected = if year == 2016 { 366 } else { 365 };
            assert_eq!(year_length(year), expected, "year {}", year);
        }
    }

    #[test]
    fn test_year_length_century_rules() {
        assert_eq!(year_length(1900), 365);
        assert_eq!(year_length(2000), 366);
        assert_eq!(year_length(2100), 365);
    }

    #[test]
    fn test_jan_first_midnight_is_whole_year() {
        assert_eq!(date_to_decimal_year(at(2015, 1, 1, 0, 0, 0)), 2015.0);
        assert_eq!(date_to_decimal_year(at(2016, 1, 1, 0, 0, 0)), 2016.0);
    }

    #[test]
    fn test_midday_fraction_uses_year_day_count() {
        // Day index 100 at noon: 100.5 / 365 in 2015, 100.5 / 366 in 2016.
        let d2015 = date_to_decimal_year(at(2015, 4, 11, 12, 0, 0));
        let d2016 = date_to_decimal_year(at(2016, 4, 10, 12, 0, 0));
        assert_abs_diff_eq!(d2015, 2015.0 + 100.5 / 365.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d2016, 2016.0 + 100.5 / 366.0, epsilon = 1e-12);
    }

    #[test]
    fn test_conversion_is_monotonic_across_new_year() {
        let before = date_to_decimal_year(at(2016, 12, 31, 23, 59, 59));
        let after = date_to_decimal_year(at(2017, 1, 1, 0, 0, 0));
        assert!(before < after);
        assert!(before > 2016.999);
    }

    #[test]
    fn test_round_trip_within_one_second() {
        let dates = [
            at(2013, 1, 1, 12, 0, 0),
            at(2014, 7, 19, 8, 41, 13),
            at(2016, 2, 29, 23, 59, 59),
            at(2016, 12, 31, 0, 0, 1),
            at(2018, 10, 3, 15, 30, 0),
        ];
        for date in dates {
            let back = decimal_year_to_date(date_to_decimal_year(date)).unwrap();
            let drift = (back - date).num_milliseconds().abs();
            assert!(drift < 1000, "{} came back as {} ({} ms off)", date, back, drift);
        }
    }

    #[test]
    fn test_non_finite_decimal_year_is_error() {
        assert!(decimal_year_to_date(f64::NAN).is_err());
        assert!(matches!(
            decimal_year_to_date(f64::INFINITY),
            Err(PrepError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn test_daily_grid_has_steps_plus_one_midday_points() {
        let grid = DenseGrid::daily(at(2013, 1, 1, 12, 0, 0), 2200);
        assert_eq!(grid.len(), 2201);
        assert_abs_diff_eq!(grid.times()[0], 2013.0 + 0.5 / 365.0, epsilon = 1e-12);
        assert!(grid.times().windows(2).all(|w| w[0] < w[1]));
        // 2013-01-01 + 2200 days = 2019-01-10
        assert_eq!(grid.last_year(), 2019);
        assert_eq!(grid.boundary_years(), BoundaryYears { first: 2013, end: 2019 });
    }
}
