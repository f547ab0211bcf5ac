//! Conversion of raw provider records into clean observation series.

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde_json::Value;

use crate::error::{OutlookError, OutlookResult};
use crate::model::{HistoricalData, ObservationSeries, RawHistory, RawRecord, Variable};

/// Value the upstream provider uses for "no observation".
pub const MISSING_SENTINEL: f64 = -999.0;

/// Compact date key format used by the provider.
pub const KEY_FORMAT: &str = "%Y%m%d";

/// 1-based day of year; leap days are counted in place.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Parses a `YYYY-MM-DD` date supplied by a user.
pub fn parse_user_date(input: &str) -> OutlookResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| OutlookError::InvalidDate { input: input.to_string() })
}

fn parse_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(key, KEY_FORMAT).ok()
}

fn parse_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if !number.is_finite() || number == MISSING_SENTINEL {
        return None;
    }
    Some(number)
}

/// Builds a series from raw records.
///
/// Records with unparseable keys are dropped. Sentinel and non-numeric values
/// become missing observations. If a date repeats, the last record wins.
pub fn normalize(variable: Variable, records: &[RawRecord]) -> OutlookResult<ObservationSeries> {
    let mut dropped = 0usize;
    let values: Vec<(NaiveDate, Option<f64>)> = records
        .iter()
        .filter_map(|record| match parse_key(&record.key) {
            Some(date) => Some((date, parse_value(&record.value))),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();

    if values.is_empty() {
        return Err(OutlookError::EmptySeries { variable });
    }

    let series = ObservationSeries::from_values(variable, values);
    debug!(
        "normalized {variable}: {} days, {} dropped keys",
        series.len(),
        dropped
    );
    Ok(series)
}

/// Normalizes every variable independently. A variable that yields no rows is
/// left out of the result instead of failing the whole request.
pub fn normalize_history(raw: &RawHistory) -> HistoricalData {
    let mut data = HistoricalData::new();

    for (variable, records) in raw {
        match normalize(*variable, records) {
            Ok(series) => data.insert(series),
            Err(err) => warn!("{err}; treating {variable} as unavailable"),
        }
    }

    data
}
