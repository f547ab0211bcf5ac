//! Per-request entry points tying the statistical components together.
//!
//! Every variable is computed on its own; an unavailable variable yields
//! `None` in the result map and never affects the others.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use log::{debug, warn};
use serde::Serialize;

use crate::daily;
use crate::model::{
    DailyEstimate, HistoricalData, MonthlyForecastBlend, MonthlyTotal, ObservationSeries, Variable,
};
use crate::monthly;
use crate::provider::{HistoryProvider, HistoryRequest};
use crate::series::normalize_history;

/// How far back to move the end of the history range when the first request
/// comes back empty (recent days are often not published yet).
pub const RETRY_LAG_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub half_width: u32,
    pub threshold: f64,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyOutlook {
    pub history: Vec<MonthlyTotal>,
    pub forecast: MonthlyForecastBlend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableForecast {
    pub variable: Variable,
    pub daily: Vec<DailyEstimate>,
    pub monthly: MonthlyOutlook,
}

pub fn monthly_outlook(series: &ObservationSeries, reference: NaiveDate) -> MonthlyOutlook {
    let history = monthly::aggregate(series);
    let forecast = monthly::blend(&history, reference);
    MonthlyOutlook { history, forecast }
}

pub fn forecast_variable(
    series: &ObservationSeries,
    start: NaiveDate,
    settings: &ForecastSettings,
) -> VariableForecast {
    let daily = daily::forecast(
        series,
        start,
        settings.days,
        settings.half_width,
        settings.threshold,
    );
    debug!(
        "{}: {} daily estimates from {} samples",
        series.variable(),
        daily.len(),
        series.len()
    );

    VariableForecast {
        variable: series.variable(),
        daily,
        monthly: monthly_outlook(series, start),
    }
}

/// Daily and monthly forecasts for each requested variable.
pub fn forecast_all(
    data: &HistoricalData,
    variables: &[Variable],
    start: NaiveDate,
    settings: &ForecastSettings,
) -> BTreeMap<Variable, Option<VariableForecast>> {
    variables
        .iter()
        .map(|&variable| {
            let forecast = data
                .get(variable)
                .map(|series| forecast_variable(series, start, settings));
            (variable, forecast)
        })
        .collect()
}

/// Daily estimates only, for a short run starting at a chosen date.
pub fn daily_all(
    data: &HistoricalData,
    variables: &[Variable],
    start: NaiveDate,
    settings: &ForecastSettings,
) -> BTreeMap<Variable, Option<Vec<DailyEstimate>>> {
    variables
        .iter()
        .map(|&variable| {
            let estimates = data.get(variable).map(|series| {
                daily::forecast(
                    series,
                    start,
                    settings.days,
                    settings.half_width,
                    settings.threshold,
                )
            });
            (variable, estimates)
        })
        .collect()
}

/// Fetches and normalizes history. If nothing usable comes back, the request
/// is repeated once with the end of the range moved back.
pub async fn load_history(
    provider: &dyn HistoryProvider,
    request: &HistoryRequest,
) -> anyhow::Result<HistoricalData> {
    let data = normalize_history(&provider.fetch(request).await?);
    if !data.is_empty() {
        return Ok(data);
    }

    let earlier = HistoryRequest {
        end: request.end - Duration::days(RETRY_LAG_DAYS),
        ..request.clone()
    };
    if earlier.end < earlier.start {
        return Ok(data);
    }

    warn!(
        "no usable history up to {}; retrying up to {}",
        request.end, earlier.end
    );
    Ok(normalize_history(&provider.fetch(&earlier).await?))
}
