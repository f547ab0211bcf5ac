//! Monthly totals and the six-month trend/climatology blend.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};

use crate::model::{
    MonthlyForecastBlend, MonthlyForecastPoint, MonthlyTotal, ObservationSeries, month_center,
};

/// Number of forward months in a blend.
pub const FORECAST_MONTHS: u32 = 6;

/// Weight of the trend projection in the combined value; climatology gets the rest.
pub const TREND_WEIGHT: f64 = 0.5;

/// Sums each (year, month) present in the series, oldest first.
///
/// Missing days contribute nothing, so months with gaps come out low.
pub fn aggregate(series: &ObservationSeries) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for point in series.iter() {
        *totals.entry(month_center(point.date)).or_insert(0.0) += point.value.unwrap_or(0.0);
    }

    totals
        .into_iter()
        .map(|(date, total)| MonthlyTotal {
            date,
            year: date.year(),
            month: date.month(),
            total,
        })
        .collect()
}

/// Ordinary least-squares line through `(1, y1), (2, y2), ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Needs at least two points.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        let n = values.len() as f64;
        let xs = (1..=values.len()).map(|i| i as f64);
        let sum_x: f64 = xs.clone().sum();
        let sum_x2: f64 = xs.clone().map(|x| x * x).sum();
        let sum_y: f64 = values.iter().sum();
        let sum_xy: f64 = xs.zip(values).map(|(x, y)| x * y).sum();

        let denominator = n * sum_x2 - sum_x * sum_x;
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        Some(Self { slope, intercept })
    }

    pub fn at(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

fn climatology(totals: &[MonthlyTotal], month: u32) -> f64 {
    let mean = |values: Vec<f64>| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    let same_month = totals
        .iter()
        .filter(|t| t.month == month)
        .map(|t| t.total)
        .collect();

    mean(same_month)
        .or_else(|| mean(totals.iter().map(|t| t.total).collect()))
        .unwrap_or(0.0)
}

/// Projects the six months following the last historical month.
///
/// `reference` only positions the forward months when `totals` is empty.
/// Months past the last representable date are left out.
pub fn blend(totals: &[MonthlyTotal], reference: NaiveDate) -> MonthlyForecastBlend {
    let anchor = totals
        .last()
        .map(|t| t.date)
        .unwrap_or_else(|| month_center(reference));

    let values: Vec<f64> = totals.iter().map(|t| t.total).collect();
    let trend = LinearTrend::fit(&values);
    let n = values.len() as f64;

    let points = (1..=FORECAST_MONTHS)
        .map_while(|k| anchor.checked_add_months(Months::new(k)).map(|date| (k, date)))
        .map(|(k, date)| {
            let trend = trend.map(|line| line.at(n + k as f64));
            let climatology = climatology(totals, date.month());
            let combined = trend.map(|t| TREND_WEIGHT * t + (1.0 - TREND_WEIGHT) * climatology);

            MonthlyForecastPoint {
                date,
                year: date.year(),
                month: date.month(),
                trend,
                climatology,
                combined,
            }
        })
        .collect();

    MonthlyForecastBlend { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn total(year: i32, month: u32, total: f64) -> MonthlyTotal {
        MonthlyTotal { date: d(year, month, 15), year, month, total }
    }

    #[test]
    fn single_month_sums_values() {
        let series = ObservationSeries::from_values(
            Variable::Precipitation,
            vec![
                (d(2020, 1, 1), Some(1.0)),
                (d(2020, 1, 2), Some(2.0)),
                (d(2020, 1, 3), Some(3.0)),
            ],
        );

        assert_eq!(aggregate(&series), vec![total(2020, 1, 6.0)]);
    }

    #[test]
    fn missing_days_count_as_zero_and_months_stay() {
        let series = ObservationSeries::from_values(
            Variable::Precipitation,
            vec![
                (d(2019, 12, 31), Some(4.0)),
                (d(2020, 1, 1), None),
                (d(2020, 2, 1), Some(2.5)),
                (d(2020, 2, 2), None),
            ],
        );

        assert_eq!(
            aggregate(&series),
            vec![total(2019, 12, 4.0), total(2020, 1, 0.0), total(2020, 2, 2.5)]
        );
    }

    #[test]
    fn trend_fits_ordinal_index() {
        let line = LinearTrend::fit(&[2.0, 4.0, 6.0]).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!(line.intercept.abs() < 1e-12);
        assert!(LinearTrend::fit(&[1.0]).is_none());
    }

    #[test]
    fn single_total_has_no_trend_and_flat_climatology() {
        let blend = blend(&[total(2020, 3, 12.0)], d(2000, 1, 1));

        assert_eq!(blend.points.len(), 6);
        for p in &blend.points {
            assert_eq!(p.trend, None);
            assert_eq!(p.climatology, 12.0);
            assert_eq!(p.combined, None);
        }
        assert_eq!((blend.points[0].year, blend.points[0].month), (2020, 4));
    }

    #[test]
    fn forward_months_wrap_the_year() {
        let totals = vec![total(2020, 10, 1.0), total(2020, 11, 2.0)];
        let months: Vec<_> = blend(&totals, d(2000, 1, 1))
            .points
            .iter()
            .map(|p| (p.year, p.month))
            .collect();

        assert_eq!(
            months,
            vec![(2020, 12), (2021, 1), (2021, 2), (2021, 3), (2021, 4), (2021, 5)]
        );
    }

    #[test]
    fn combined_is_even_blend_of_trend_and_climatology() {
        // Two Januaries and two Februaries; the line is y = 10 * x.
        let totals = vec![
            total(2020, 1, 10.0),
            total(2020, 2, 20.0),
            total(2020, 3, 30.0),
            total(2020, 4, 40.0),
        ];
        let blend = blend(&totals, d(2000, 1, 1));
        let first = blend.points[0];

        assert_eq!((first.year, first.month), (2020, 5));
        let trend = first.trend.unwrap();
        assert!((trend - 50.0).abs() < 1e-9);
        // No historical May: fall back to the mean of all totals.
        assert_eq!(first.climatology, 25.0);
        assert!((first.combined.unwrap() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn climatology_uses_matching_calendar_month() {
        let totals = vec![
            total(2019, 1, 4.0),
            total(2019, 2, 100.0),
            total(2020, 1, 8.0),
            total(2020, 12, 0.0),
        ];
        let blend = blend(&totals, d(2000, 1, 1));

        let january = blend.points[0];
        assert_eq!((january.year, january.month), (2021, 1));
        assert_eq!(january.climatology, 6.0);

        let february = blend.points[1];
        assert_eq!(february.climatology, 100.0);
    }

    #[test]
    fn no_history_gives_zero_climatology_from_reference() {
        let blend = blend(&[], d(2024, 8, 20));

        assert_eq!(blend.points.len(), 6);
        assert_eq!((blend.points[0].year, blend.points[0].month), (2024, 9));
        for p in &blend.points {
            assert_eq!(p.climatology, 0.0);
            assert_eq!(p.trend, None);
            assert_eq!(p.combined, None);
        }
    }

    #[test]
    fn months_are_dated_on_the_fifteenth() {
        let series = ObservationSeries::from_values(
            Variable::Precipitation,
            vec![(d(2020, 2, 29), Some(1.0)), (d(2020, 3, 1), Some(2.0))],
        );
        let totals = aggregate(&series);
        let centers: Vec<_> = totals.iter().map(|t| t.date).collect();
        assert_eq!(centers, vec![d(2020, 2, 15), d(2020, 3, 15)]);

        let blend = blend(&totals, d(2000, 1, 1));
        let dates: Vec<_> = blend.points.iter().map(|p| p.date).collect();
        assert_eq!(dates[0], d(2020, 4, 15));
        assert_eq!(dates[5], d(2020, 9, 15));

        let json = serde_json::to_value(blend.points[0]).unwrap();
        assert_eq!(json["date"], "2020-04-15");
        assert_eq!(json["month"], 4);
    }
}
