//! Core library for the `outlook` CLI.
//!
//! Estimates how likely a calendar date is to be hot, cold, windy or wet at a
//! point, using decades of daily observations instead of a physical model.
//!
//! This crate defines:
//! - Series normalization and circular day-of-year window matching
//! - Daily exceedance forecasts and the monthly trend/climatology blend
//! - Single-date condition classification
//! - Configuration handling and the history-provider abstraction
//!
//! All computations are pure functions of their inputs; nothing is cached
//! between calls.

pub mod classify;
pub mod config;
pub mod daily;
pub mod error;
pub mod model;
pub mod monthly;
pub mod outlook;
pub mod provider;
pub mod series;
pub mod stats;
pub mod window;

pub use config::{Config, ProviderConfig};
pub use error::{OutlookError, OutlookResult};
pub use model::{
    ClassificationVerdict, DailyEstimate, Direction, HistoricalData, MonthlyForecastBlend,
    MonthlyForecastPoint, MonthlyTotal, ObservationSeries, Overall, ThresholdSpec, Thresholds,
    Variable, WindowQuery,
};
pub use outlook::{ForecastSettings, VariableForecast};
pub use provider::{HistoryProvider, HistoryRequest, ProviderId};
