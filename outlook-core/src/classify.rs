//! Single-date classification against per-variable thresholds.
//!
//! The verdict is a fixed decision table evaluated in order: temperature
//! extremes (flagged at 60%), then rain, wind and aerosol (flagged at 50%).
//! Any temperature flag, or two flags of any kind, makes the date
//! "not favourable"; a single other flag only asks for caution.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;

use crate::model::{
    ClassificationVerdict, HistoricalData, Metric, Overall, ThresholdSpec, Thresholds, Variable,
    VariableStats, WindowQuery,
};
use crate::window::matching_values;

/// Probability at or above which a hot or cold day is "very likely".
pub const TEMPERATURE_FLAG: f64 = 0.6;

/// Probability at or above which rain, wind or aerosol is flagged.
pub const OTHER_FLAG: f64 = 0.5;

pub const NO_DATA: &str = "No data";

const NOT_AVAILABLE: &str = "n/a";

const CLEAR_SUMMARY: &str = "Conditions are not strongly unfavorable based on historical \
probabilities for that date. You may still want to check short-term forecasts near the date.";

/// Mean and threshold probability over an already matched sample set.
pub fn stats_for(samples: &[f64], spec: &ThresholdSpec) -> VariableStats {
    if samples.is_empty() {
        return VariableStats { samples: 0, mean: None, probability: None };
    }

    let n = samples.len() as f64;
    let hits = samples.iter().filter(|&&v| spec.matches(v)).count() as f64;

    VariableStats {
        samples: samples.len(),
        mean: Some(samples.iter().sum::<f64>() / n),
        probability: Some(hits / n),
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn percent(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

/// Threshold as configured, without rounding (`35.0`, `35.25`, `0.3`).
fn as_given(value: f64) -> String {
    format!("{value:?}")
}

fn reaches(stats: &VariableStats, level: f64) -> Option<f64> {
    stats.probability.filter(|p| *p >= level)
}

fn window_samples(data: &HistoricalData, variable: Variable, query: WindowQuery) -> Option<Vec<f64>> {
    let samples = data
        .get(variable)
        .map(|series| matching_values(series, query))
        .filter(|samples| !samples.is_empty());

    debug!(
        "{variable} on {}: {} samples",
        query.target,
        samples.as_ref().map_or(0, Vec::len)
    );
    samples
}

/// Accumulates detail rows and flags while each variable is evaluated.
#[derive(Default)]
struct Verdict {
    details: Vec<(String, String)>,
    stats: BTreeMap<Metric, VariableStats>,
    flags: Vec<String>,
    severe: bool,
}

impl Verdict {
    fn detail(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.details.push((key.into(), value.into()));
    }

    fn temperature(&mut self, data: &HistoricalData, query: WindowQuery, t: &Thresholds) {
        let Some(samples) = window_samples(data, Variable::Temperature, query) else {
            self.detail("Temperature", NO_DATA);
            return;
        };

        let hot = stats_for(&samples, &t.hot);
        let cold = stats_for(&samples, &t.cold);

        self.detail("Temperature_samples", hot.samples.to_string());
        self.detail("Temp_mean_degC", fmt_opt(hot.mean, 2));
        self.detail(
            format!("Prob_hot_{}{:.1}C", t.hot.direction.symbol(), t.hot.value),
            fmt_opt(hot.probability, 3),
        );
        self.detail(
            format!("Prob_cold_{}{:.1}C", t.cold.direction.symbol(), t.cold.value),
            fmt_opt(cold.probability, 3),
        );

        if let Some(p) = reaches(&hot, TEMPERATURE_FLAG) {
            self.severe = true;
            self.flags.push(format!(
                "Very likely HOT ({}{} °C): {}",
                t.hot.direction.pretty_symbol(),
                as_given(t.hot.value),
                percent(p)
            ));
        }
        if let Some(p) = reaches(&cold, TEMPERATURE_FLAG) {
            self.severe = true;
            self.flags.push(format!(
                "Very likely COLD ({}{} °C): {}",
                t.cold.direction.pretty_symbol(),
                as_given(t.cold.value),
                percent(p)
            ));
        }

        self.stats.insert(Metric::Hot, hot);
        self.stats.insert(Metric::Cold, cold);
    }

    fn precipitation(&mut self, data: &HistoricalData, query: WindowQuery, spec: &ThresholdSpec) {
        let Some(samples) = window_samples(data, Variable::Precipitation, query) else {
            self.detail("Precipitation", NO_DATA);
            return;
        };

        let rain = stats_for(&samples, spec);
        self.detail("Precip_samples", rain.samples.to_string());
        self.detail("Precip_mean_mm", fmt_opt(rain.mean, 2));
        self.detail(
            format!("Prob_rain_{}{:.1}mm", spec.direction.symbol(), spec.value),
            fmt_opt(rain.probability, 3),
        );

        if let Some(p) = reaches(&rain, OTHER_FLAG) {
            self.flags.push(format!(
                "Likely rainy ({}{} mm/day): {}",
                spec.direction.pretty_symbol(),
                as_given(spec.value),
                percent(p)
            ));
        }
        self.stats.insert(Metric::Rain, rain);
    }

    fn wind(&mut self, data: &HistoricalData, query: WindowQuery, spec: &ThresholdSpec) {
        let Some(samples) = window_samples(data, Variable::Wind, query) else {
            self.detail("Wind", NO_DATA);
            return;
        };

        let wind = stats_for(&samples, spec);
        self.detail("Wind_samples", wind.samples.to_string());
        self.detail("Wind_mean_mps", fmt_opt(wind.mean, 2));
        self.detail(
            format!("Prob_wind_{}{:.1}m/s", spec.direction.symbol(), spec.value),
            fmt_opt(wind.probability, 3),
        );

        if let Some(p) = reaches(&wind, OTHER_FLAG) {
            self.flags.push(format!(
                "Likely windy ({}{} m/s): {}",
                spec.direction.pretty_symbol(),
                as_given(spec.value),
                percent(p)
            ));
        }
        self.stats.insert(Metric::Wind, wind);
    }

    fn aerosol(&mut self, data: &HistoricalData, query: WindowQuery, spec: &ThresholdSpec) {
        let Some(samples) = window_samples(data, Variable::Aerosol, query) else {
            self.detail("AOD", NO_DATA);
            return;
        };

        let aod = stats_for(&samples, spec);
        self.detail("AOD_samples", aod.samples.to_string());
        self.detail("AOD_mean", fmt_opt(aod.mean, 3));
        self.detail(
            format!("Prob_aod_{}{:.2}", spec.direction.symbol(), spec.value),
            fmt_opt(aod.probability, 3),
        );

        if let Some(p) = reaches(&aod, OTHER_FLAG) {
            self.flags.push(format!(
                "High aerosol (AOD {}{}): {}",
                spec.direction.pretty_symbol(),
                as_given(spec.value),
                percent(p)
            ));
        }
        self.stats.insert(Metric::Aerosol, aod);
    }

    fn overall(&self) -> Overall {
        if self.flags.is_empty() {
            Overall::NoConcerns
        } else if self.severe || self.flags.len() >= 2 {
            Overall::NotFavourable
        } else {
            Overall::Caution
        }
    }

    fn finish(self, date: NaiveDate) -> ClassificationVerdict {
        let overall = self.overall();
        let summary = match overall {
            Overall::NoConcerns => CLEAR_SUMMARY.to_string(),
            _ => {
                let bullets: Vec<String> = self.flags.iter().map(|f| format!(" - {f}")).collect();
                let closing = match overall {
                    Overall::NotFavourable => {
                        "Overall: NOT FAVOURABLE to go out (based on historical probabilities)."
                    }
                    _ => "Overall: CAUTION recommended.",
                };
                format!(
                    "Potential issues based on historical probabilities:\n{}\n\n{closing}",
                    bullets.join("\n")
                )
            }
        };

        ClassificationVerdict {
            date,
            summary,
            overall,
            flags: self.flags,
            stats: self.stats,
            details: self.details,
        }
    }
}

/// Classifies `target` using every available series in `data`.
///
/// Variables without a series, or whose window matches nothing, are reported
/// as "No data" and never raise a flag. Aerosol is only considered when
/// `track_aerosol` is set.
pub fn classify(
    data: &HistoricalData,
    target: NaiveDate,
    half_width: u32,
    thresholds: &Thresholds,
    track_aerosol: bool,
) -> ClassificationVerdict {
    let query = WindowQuery::new(target, half_width);
    let mut verdict = Verdict::default();

    verdict.temperature(data, query, thresholds);
    verdict.precipitation(data, query, &thresholds.rain);
    verdict.wind(data, query, &thresholds.wind);
    if track_aerosol {
        verdict.aerosol(data, query, &thresholds.aerosol);
    }

    verdict.finish(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObservationSeries;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Ten consecutive days around July 10 in 2015, cycling through `values`.
    fn around_july(variable: Variable, values: &[f64]) -> ObservationSeries {
        let start = d(2015, 7, 5);
        ObservationSeries::from_values(
            variable,
            (0..10).map(|i| (start + Duration::days(i), Some(values[i as usize % values.len()]))),
        )
    }

    fn data(series: Vec<ObservationSeries>) -> HistoricalData {
        let mut data = HistoricalData::new();
        for s in series {
            data.insert(s);
        }
        data
    }

    fn target() -> NaiveDate {
        d(2026, 7, 10)
    }

    #[test]
    fn mostly_hot_is_not_favourable() {
        // 7 of 10 above 35.
        let temps = [40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 20.0, 20.0, 20.0];
        let data = data(vec![around_july(Variable::Temperature, &temps)]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.overall, Overall::NotFavourable);
        assert_eq!(verdict.flags.len(), 1);
        assert!(verdict.flags[0].starts_with("Very likely HOT"));
        assert!(verdict.flags[0].ends_with("70%"));
        assert!(verdict.summary.contains("NOT FAVOURABLE"));
        assert_eq!(verdict.detail("Temperature_samples"), Some("10"));
        assert_eq!(verdict.detail("Prob_hot_>35.0C"), Some("0.700"));
        assert_eq!(verdict.detail("Prob_cold_<5.0C"), Some("0.000"));
        assert_eq!(verdict.detail("Temp_mean_degC"), Some("34.00"));
    }

    #[test]
    fn single_rain_flag_is_caution() {
        let temps = [20.0];
        let rain: Vec<f64> = (0..10).map(|i| if i < 6 { 8.0 } else { 0.0 }).collect();
        let wind = [2.0];
        let data = data(vec![
            around_july(Variable::Temperature, &temps),
            around_july(Variable::Precipitation, &rain),
            around_july(Variable::Wind, &wind),
        ]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.overall, Overall::Caution);
        assert_eq!(verdict.flags, vec!["Likely rainy (≥5.0 mm/day): 60%".to_string()]);
        assert!(verdict.summary.ends_with("Overall: CAUTION recommended."));
        assert_eq!(verdict.detail("Prob_rain_>=5.0mm"), Some("0.600"));
    }

    #[test]
    fn two_mild_flags_are_not_favourable() {
        let data = data(vec![
            around_july(Variable::Temperature, &[20.0]),
            around_july(Variable::Precipitation, &[9.0]),
            around_july(Variable::Wind, &[15.0]),
        ]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.overall, Overall::NotFavourable);
        assert_eq!(verdict.flags.len(), 2);
        assert!(verdict.flags[0].starts_with("Likely rainy"));
        assert!(verdict.flags[1].starts_with("Likely windy"));
    }

    #[test]
    fn temperature_uses_higher_flag_level() {
        // 55% hot is below the temperature flag level.
        let temps: Vec<f64> = (0..20).map(|i| if i < 11 { 40.0 } else { 20.0 }).collect();
        let start = d(2015, 7, 1);
        let series = ObservationSeries::from_values(
            Variable::Temperature,
            temps.iter().enumerate().map(|(i, v)| (start + Duration::days(i as i64), Some(*v))),
        );
        let data = data(vec![series]);

        let verdict = classify(&data, d(2026, 7, 10), 10, &Thresholds::default(), false);

        assert!(verdict.flags.is_empty());
        assert_eq!(verdict.overall, Overall::NoConcerns);
        assert_eq!(verdict.summary, CLEAR_SUMMARY);
    }

    #[test]
    fn cold_flag_uses_same_samples() {
        let data = data(vec![around_july(Variable::Temperature, &[0.0, 1.0, 2.0, 30.0])]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.overall, Overall::NotFavourable);
        assert!(verdict.flags[0].starts_with("Very likely COLD (<5.0 °C)"));
        assert_eq!(verdict.stats[&Metric::Hot].samples, verdict.stats[&Metric::Cold].samples);
    }

    #[test]
    fn unavailable_and_empty_windows_report_no_data() {
        // Wind exists but nowhere near January.
        let data = data(vec![around_july(Variable::Wind, &[30.0])]);

        let verdict = classify(&data, d(2026, 1, 10), 7, &Thresholds::default(), true);

        assert_eq!(verdict.detail("Temperature"), Some(NO_DATA));
        assert_eq!(verdict.detail("Precipitation"), Some(NO_DATA));
        assert_eq!(verdict.detail("Wind"), Some(NO_DATA));
        assert_eq!(verdict.detail("AOD"), Some(NO_DATA));
        assert!(verdict.stats.is_empty());
        assert_eq!(verdict.overall, Overall::NoConcerns);
    }

    #[test]
    fn aerosol_only_when_tracked() {
        let data = data(vec![around_july(Variable::Aerosol, &[0.8])]);

        let untracked = classify(&data, target(), 7, &Thresholds::default(), false);
        assert!(untracked.detail("AOD_samples").is_none());
        assert!(untracked.flags.is_empty());

        let tracked = classify(&data, target(), 7, &Thresholds::default(), true);
        assert_eq!(tracked.detail("AOD_samples"), Some("10"));
        assert_eq!(tracked.detail("Prob_aod_>0.30"), Some("1.000"));
        assert_eq!(tracked.overall, Overall::Caution);
        assert!(tracked.flags[0].starts_with("High aerosol"));
    }

    #[test]
    fn flags_keep_fixed_order() {
        let data = data(vec![
            around_july(Variable::Temperature, &[45.0]),
            around_july(Variable::Precipitation, &[20.0]),
            around_july(Variable::Wind, &[20.0]),
            around_july(Variable::Aerosol, &[1.0]),
        ]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), true);

        let prefixes: Vec<_> = verdict
            .flags
            .iter()
            .map(|f| f.split(' ').take(2).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(
            prefixes,
            vec!["Very likely", "Likely rainy", "Likely windy", "High aerosol"]
        );
        assert!(verdict.summary.starts_with("Potential issues"));
        assert!(verdict.summary.contains(" - Very likely HOT"));
    }

    fn hot_then_mild(hot: usize) -> Vec<f64> {
        (0..10).map(|i| if i < hot { 40.0 } else { 20.0 }).collect()
    }

    #[test]
    fn exactly_sixty_percent_hot_is_flagged() {
        let data = data(vec![around_july(Variable::Temperature, &hot_then_mild(6))]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.stats[&Metric::Hot].probability, Some(0.6));
        assert_eq!(verdict.flags, vec!["Very likely HOT (>35.0 °C): 60%".to_string()]);
        assert_eq!(verdict.overall, Overall::NotFavourable);
    }

    #[test]
    fn rain_at_threshold_counts_and_half_is_flagged() {
        // Half the days sit exactly on 5.0 mm, which the >= test counts.
        let rain = [5.0, 0.0];
        let data = data(vec![
            around_july(Variable::Temperature, &[20.0]),
            around_july(Variable::Precipitation, &rain),
        ]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.stats[&Metric::Rain].probability, Some(0.5));
        assert_eq!(verdict.detail("Prob_rain_>=5.0mm"), Some("0.500"));
        assert_eq!(verdict.flags, vec!["Likely rainy (≥5.0 mm/day): 50%".to_string()]);
        assert_eq!(verdict.overall, Overall::Caution);
    }

    #[test]
    fn half_windy_is_flagged() {
        let data = data(vec![around_july(Variable::Wind, &[11.0, 2.0])]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.stats[&Metric::Wind].probability, Some(0.5));
        assert_eq!(verdict.flags, vec!["Likely windy (>10.0 m/s): 50%".to_string()]);
        assert_eq!(verdict.overall, Overall::Caution);
    }

    #[test]
    fn wind_at_threshold_is_not_counted() {
        let data = data(vec![around_july(Variable::Wind, &[10.0])]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);

        assert_eq!(verdict.stats[&Metric::Wind].probability, Some(0.0));
        assert!(verdict.flags.is_empty());
    }

    #[test]
    fn flag_text_keeps_configured_precision() {
        let mut thresholds = Thresholds::default();
        thresholds.hot.value = 35.25;
        thresholds.aerosol.value = 0.3;
        let data = data(vec![
            around_july(Variable::Temperature, &[40.0]),
            around_july(Variable::Aerosol, &[0.8]),
        ]);

        let verdict = classify(&data, target(), 7, &thresholds, true);

        assert_eq!(verdict.flags[0], "Very likely HOT (>35.25 °C): 100%");
        assert_eq!(verdict.flags[1], "High aerosol (AOD >0.3): 100%");
    }

    #[test]
    fn details_serialize_as_ordered_object() {
        let data = data(vec![around_july(Variable::Temperature, &[20.0])]);

        let verdict = classify(&data, target(), 7, &Thresholds::default(), false);
        let json = serde_json::to_string(&verdict).unwrap();

        assert!(json.contains(
            r#""details":{"Temperature_samples":"10","Temp_mean_degC":"20.00","#
        ));
        assert!(json.contains(r#""Precipitation":"No data","Wind":"No data"}"#));
    }
}
