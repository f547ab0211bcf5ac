//! Summary statistics for a fixed day of the month across every year of history.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::{HistoricalData, ObservationSeries, Variable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfMonthStats {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Non-missing observations falling on `day` of any month, or `None` if there are none.
pub fn day_of_month(series: &ObservationSeries, day: u32) -> Option<DayOfMonthStats> {
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = series
        .iter()
        .filter(|p| p.date.day() == day)
        .filter_map(|p| p.value.map(|v| (p.date, v)))
        .unzip();

    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(DayOfMonthStats {
        dates,
        values: values.into_iter().map(round2).collect(),
        mean: round2(mean),
        min: round2(min),
        max: round2(max),
        count,
    })
}

/// Stats for each requested day and each available variable. Days without
/// data for a variable are left out for that variable.
pub fn days_of_month(
    data: &HistoricalData,
    days: &[u32],
) -> BTreeMap<u32, BTreeMap<Variable, DayOfMonthStats>> {
    days.iter()
        .map(|&day| {
            let per_variable = data
                .available()
                .into_iter()
                .filter_map(|variable| {
                    let series = data.get(variable)?;
                    day_of_month(series, day).map(|stats| (variable, stats))
                })
                .collect();
            (day, per_variable)
        })
        .collect()
}
