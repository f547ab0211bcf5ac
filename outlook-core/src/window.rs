//! Circular day-of-year window matching.

use chrono::NaiveDate;

use crate::model::{ObservationSeries, WindowQuery};
use crate::series::day_of_year;

/// Length of the cycle used for wrap-around. Leap years are not special-cased.
pub const YEAR_CYCLE: u32 = 365;

/// Shorter distance between two day-of-year values around a 365-day cycle.
pub fn circular_distance(a: u32, b: u32) -> u32 {
    let raw = a.abs_diff(b);
    raw.min(YEAR_CYCLE.saturating_sub(raw))
}

/// Circular day-of-year distance between two dates; the year is ignored.
pub fn date_distance(a: NaiveDate, b: NaiveDate) -> u32 {
    circular_distance(day_of_year(a), day_of_year(b))
}

/// Non-missing values whose day of year lies within the query's window.
///
/// An empty result is a normal outcome.
pub fn matching_values(series: &ObservationSeries, query: WindowQuery) -> Vec<f64> {
    series
        .iter()
        .filter(|p| date_distance(p.date, query.target) <= query.half_width)
        .filter_map(|p| p.value)
        .collect()
}
