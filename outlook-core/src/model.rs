use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::OutlookError;

/// A tracked weather variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Temperature,
    Precipitation,
    Wind,
    Aerosol,
}

impl Variable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Precipitation => "precipitation",
            Variable::Wind => "wind",
            Variable::Aerosol => "aerosol",
        }
    }

    /// Variables tracked by every request; aerosol is opt-in.
    pub const fn core() -> &'static [Variable] {
        &[Variable::Temperature, Variable::Precipitation, Variable::Wind]
    }

    pub const fn all() -> &'static [Variable] {
        &[
            Variable::Temperature,
            Variable::Precipitation,
            Variable::Wind,
            Variable::Aerosol,
        ]
    }

    /// Parameter names the provider may use for this variable, most specific first.
    pub fn power_candidates(&self) -> &'static [&'static str] {
        match self {
            Variable::Temperature => &["T2M", "T2", "T2M_AVG", "TMP", "AIR_TEMPERATURE"],
            Variable::Precipitation => {
                &["PRECTOT", "PRECTOTCORR", "PRECTOTCORR8", "PRECTOT_C", "PRECTOT_CORR"]
            }
            Variable::Wind => &["WS2M", "WIND", "WS"],
            Variable::Aerosol => &["AOD", "AOD550", "AOD_550", "AOD_470", "AOD550_AEROSOL"],
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::Precipitation => "mm/day",
            Variable::Wind => "m/s",
            Variable::Aerosol => "",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Variable {
    type Error = OutlookError;

    /// Accepts canonical names, short aliases and POWER parameter codes.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "temperature" | "temp" | "t2m" => Ok(Variable::Temperature),
            "precipitation" | "precip" | "rain" | "prectot" => Ok(Variable::Precipitation),
            "wind" | "wind-speed" | "ws2m" => Ok(Variable::Wind),
            "aerosol" | "aerosol-optical-depth" | "aod" => Ok(Variable::Aerosol),
            _ => Err(OutlookError::UnknownVariable { name: value.to_string() }),
        }
    }
}

/// One day of a historical series. `None` marks a missing observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Daily observations for one variable, strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSeries {
    variable: Variable,
    points: Vec<Observation>,
}

impl ObservationSeries {
    /// Builds a series from unordered pairs. Later duplicates of a date replace
    /// earlier ones.
    pub fn from_values<I>(variable: Variable, values: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let by_date: BTreeMap<NaiveDate, Option<f64>> = values.into_iter().collect();
        let points = by_date
            .into_iter()
            .map(|(date, value)| Observation { date, value })
            .collect();

        Self { variable, points }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// A target date and the half-width of the circular day-of-year window around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowQuery {
    pub target: NaiveDate,
    pub half_width: u32,
}

impl WindowQuery {
    pub fn new(target: NaiveDate, half_width: u32) -> Self {
        Self { target, half_width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyEstimate {
    pub date: NaiveDate,
    pub mean: Option<f64>,
    pub probability: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// Representative date of the month, always the 15th.
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub total: f64,
}

/// One forward month of the trend/climatology blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyForecastPoint {
    /// The 15th of the forecast month.
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub trend: Option<f64>,
    pub climatology: f64,
    pub combined: Option<f64>,
}

/// The 15th of the month containing `date`.
pub(crate) fn month_center(date: NaiveDate) -> NaiveDate {
    date.with_day(15).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyForecastBlend {
    pub points: Vec<MonthlyForecastPoint>,
}

/// Comparison applied to a sample against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Strictly greater than.
    Above,
    /// Greater than or equal.
    AtLeast,
    /// Strictly less than.
    Below,
}

impl Direction {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => value > threshold,
            Direction::AtLeast => value >= threshold,
            Direction::Below => value < threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Direction::Above => ">",
            Direction::AtLeast => ">=",
            Direction::Below => "<",
        }
    }

    pub fn pretty_symbol(&self) -> &'static str {
        match self {
            Direction::Above => ">",
            Direction::AtLeast => "≥",
            Direction::Below => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub value: f64,
    pub direction: Direction,
}

impl ThresholdSpec {
    pub const fn new(value: f64, direction: Direction) -> Self {
        Self { value, direction }
    }

    pub fn matches(&self, sample: f64) -> bool {
        self.direction.holds(sample, self.value)
    }
}

/// Per-metric thresholds used by the single-date classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub hot: ThresholdSpec,
    pub cold: ThresholdSpec,
    pub wind: ThresholdSpec,
    pub rain: ThresholdSpec,
    pub aerosol: ThresholdSpec,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hot: ThresholdSpec::new(35.0, Direction::Above),
            cold: ThresholdSpec::new(5.0, Direction::Below),
            wind: ThresholdSpec::new(10.0, Direction::Above),
            rain: ThresholdSpec::new(5.0, Direction::AtLeast),
            aerosol: ThresholdSpec::new(0.3, Direction::Above),
        }
    }
}

/// A classified quantity: temperature contributes two (hot and cold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Hot,
    Cold,
    Rain,
    Wind,
    Aerosol,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariableStats {
    pub samples: usize,
    pub mean: Option<f64>,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    NoConcerns,
    Caution,
    NotFavourable,
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Overall::NoConcerns => "no strong concerns",
            Overall::Caution => "CAUTION recommended",
            Overall::NotFavourable => "NOT FAVOURABLE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationVerdict {
    pub date: NaiveDate,
    pub summary: String,
    pub overall: Overall,
    pub flags: Vec<String>,
    pub stats: BTreeMap<Metric, VariableStats>,
    /// Flat key/value pairs in display order; serialized as an object.
    #[serde(serialize_with = "details_as_map")]
    pub details: Vec<(String, String)>,
}

fn details_as_map<S>(details: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(details.iter().map(|(k, v)| (k, v)))
}

impl ClassificationVerdict {
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A raw provider record: compact `YYYYMMDD` key plus whatever value the provider sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub key: String,
    pub value: serde_json::Value,
}

/// Raw provider output. A variable missing from the map is unavailable.
pub type RawHistory = BTreeMap<Variable, Vec<RawRecord>>;

/// Normalized series for one request. A variable missing from the map is unavailable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalData {
    series: BTreeMap<Variable, ObservationSeries>,
}

impl HistoricalData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: ObservationSeries) {
        self.series.insert(series.variable(), series);
    }

    pub fn get(&self, variable: Variable) -> Option<&ObservationSeries> {
        self.series.get(&variable)
    }

    pub fn available(&self) -> Vec<Variable> {
        self.series.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
