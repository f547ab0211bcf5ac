use chrono::{Days, NaiveDate};

use crate::model::{DailyEstimate, ObservationSeries, WindowQuery};
use crate::window::matching_values;

/// Mean and share of samples strictly above `threshold`, or `None` for an empty set.
pub fn mean_and_exceedance(samples: &[f64], threshold: f64) -> (Option<f64>, Option<f64>) {
    if samples.is_empty() {
        return (None, None);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let above = samples.iter().filter(|&&v| v > threshold).count() as f64;
    (Some(mean), Some(above / n))
}

/// Estimate for a single date.
pub fn estimate(
    series: &ObservationSeries,
    date: NaiveDate,
    half_width: u32,
    threshold: f64,
) -> DailyEstimate {
    let samples = matching_values(series, WindowQuery::new(date, half_width));
    let (mean, probability) = mean_and_exceedance(&samples, threshold);

    DailyEstimate {
        date,
        mean,
        probability,
        samples: samples.len(),
    }
}

/// One estimate per consecutive date starting at `start`.
///
/// The run stops early at the last representable date.
pub fn forecast(
    series: &ObservationSeries,
    start: NaiveDate,
    n_days: usize,
    half_width: u32,
    threshold: f64,
) -> Vec<DailyEstimate> {
    (0..n_days as u64)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .map(|date| estimate(series, date, half_width, threshold))
        .collect()
}
