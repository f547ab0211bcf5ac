use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use log::debug;
use outlook_core::{
    Config, HistoricalData, HistoryProvider, HistoryRequest, OutlookError, ProviderId, Variable,
    classify, outlook, provider::provider_from_config, series::parse_user_date, stats,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "outlook",
    version,
    about = "Historical odds of extreme weather for any point and date"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the history comes from.
#[derive(Debug, Args)]
pub struct Source {
    /// Latitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Read history from a saved POWER JSON or CSV file instead of the network.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Variable held by a CSV history file (default: precipitation).
    #[arg(long, requires = "file", value_parser = parse_variable)]
    csv_variable: Option<Variable>,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the window, thresholds and provider settings.
    Configure,

    /// Daily odds from tomorrow plus a six-month trend/climatology outlook.
    Forecast {
        #[command(flatten)]
        source: Source,

        /// Number of days in the daily run; defaults to the configured length.
        #[arg(long)]
        days: Option<usize>,
    },

    /// Daily odds for a short run starting at DATE (YYYY-MM-DD).
    Daily {
        date: String,

        #[command(flatten)]
        source: Source,

        #[arg(long, default_value_t = 7)]
        days: usize,
    },

    /// Classify a single date (YYYY-MM-DD) as favourable or not.
    Check {
        date: String,

        #[command(flatten)]
        source: Source,
    },

    /// Statistics for fixed days of the month across all years.
    Stats {
        #[command(flatten)]
        source: Source,

        /// Day of month (1-31); repeat for several days.
        #[arg(long = "day", required = true, value_parser = clap::value_parser!(u32).range(1..=31))]
        days: Vec<u32>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Forecast { source, days } => {
                let config = Config::load()?;
                let data = load(&config, &source).await?;

                let mut settings = config.forecast_settings();
                if let Some(days) = days {
                    settings.days = days;
                }
                let start = today() + Duration::days(1);
                let result =
                    outlook::forecast_all(&data, &config.tracked_variables(), start, &settings);

                if source.json {
                    render::json(&result)
                } else {
                    render::forecast(&result);
                    Ok(())
                }
            }
            Command::Daily { date, source, days } => {
                let start = parse_user_date(&date)?;
                let config = Config::load()?;
                let data = load(&config, &source).await?;

                let mut settings = config.forecast_settings();
                settings.days = days;
                let result =
                    outlook::daily_all(&data, &config.tracked_variables(), start, &settings);

                if source.json {
                    render::json(&result)
                } else {
                    render::daily(&result);
                    Ok(())
                }
            }
            Command::Check { date, source } => {
                let target = parse_user_date(&date)?;
                let config = Config::load()?;
                let data = load(&config, &source).await?;

                let verdict = classify::classify(
                    &data,
                    target,
                    config.window_days,
                    &config.thresholds,
                    config.track_aerosol,
                );

                if source.json {
                    render::json(&verdict)
                } else {
                    render::verdict(&verdict);
                    Ok(())
                }
            }
            Command::Stats { source, days } => {
                let config = Config::load()?;
                let data = load(&config, &source).await?;
                let result = stats::days_of_month(&data, &days);

                if source.json {
                    render::json(&result)
                } else {
                    render::day_stats(&result);
                    Ok(())
                }
            }
        }
    }
}

fn parse_variable(value: &str) -> Result<Variable, OutlookError> {
    Variable::try_from(value)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn load(config: &Config, source: &Source) -> anyhow::Result<HistoricalData> {
    let provider: Box<dyn HistoryProvider> =
        provider_from_config(config, source.file.as_deref(), source.csv_variable)?;

    let request = HistoryRequest {
        latitude: source.lat,
        longitude: source.lon,
        start: config.history_start,
        end: today() - Duration::days(1),
        variables: config.tracked_variables(),
    };
    debug!("history request: {request:?}");

    let data = outlook::load_history(provider.as_ref(), &request)
        .await
        .context("Failed to load historical data")?;

    let missing: Vec<&str> = request
        .variables
        .iter()
        .filter(|v| data.get(**v).is_none())
        .map(Variable::as_str)
        .collect();
    if !missing.is_empty() {
        eprintln!("Note: no historical data for {}", missing.join(", "));
    }

    Ok(data)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    config.window_days = CustomType::<u32>::new("Window half-width (days):")
        .with_default(config.window_days)
        .prompt()?;
    config.forecast_days = CustomType::<usize>::new("Daily forecast length (days):")
        .with_default(config.forecast_days)
        .prompt()?;

    config.thresholds.hot.value = CustomType::<f64>::new("Hot threshold (°C):")
        .with_default(config.thresholds.hot.value)
        .prompt()?;
    config.thresholds.cold.value = CustomType::<f64>::new("Cold threshold (°C):")
        .with_default(config.thresholds.cold.value)
        .prompt()?;
    config.thresholds.wind.value = CustomType::<f64>::new("Windy threshold (m/s):")
        .with_default(config.thresholds.wind.value)
        .prompt()?;
    config.thresholds.rain.value = CustomType::<f64>::new("Rainy threshold (mm/day):")
        .with_default(config.thresholds.rain.value)
        .prompt()?;

    config.track_aerosol = Confirm::new("Track aerosol optical depth?")
        .with_default(config.track_aerosol)
        .prompt()?;
    if config.track_aerosol {
        config.thresholds.aerosol.value = CustomType::<f64>::new("High aerosol threshold (AOD):")
            .with_default(config.thresholds.aerosol.value)
            .prompt()?;
    }

    let ids: Vec<&str> = ProviderId::all().iter().map(ProviderId::as_str).collect();
    let chosen = Select::new("Default history provider:", ids).prompt()?;
    config.set_default_provider(ProviderId::try_from(chosen)?);

    let token = Text::new("NASA POWER token (leave empty for none):")
        .with_default(config.provider.token.as_deref().unwrap_or(""))
        .prompt()?;
    config.provider.token = Some(token.trim().to_string()).filter(|t| !t.is_empty());

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
