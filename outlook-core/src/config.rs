use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::{Thresholds, Variable};
use crate::outlook::ForecastSettings;
use crate::provider::ProviderId;

pub const DEFAULT_POWER_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";

/// Settings for the history provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POWER_URL.to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// window_days = 10
/// track_aerosol = true
///
/// [thresholds.hot]
/// value = 32.0
/// direction = "above"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional default provider id, "power" or "file".
    pub default_provider: Option<String>,

    /// Half-width of the day-of-year window, in days.
    pub window_days: u32,

    /// Exceedance threshold used by daily forecasts.
    pub forecast_threshold: f64,

    /// Length of the daily forecast run.
    pub forecast_days: usize,

    /// First day of history requested from the provider.
    pub history_start: NaiveDate,

    pub track_aerosol: bool,

    pub thresholds: Thresholds,

    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            window_days: 7,
            forecast_threshold: 1.0,
            forecast_days: 183,
            history_start: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or_default(),
            track_aerosol: false,
            thresholds: Thresholds::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Falls back to the POWER provider when nothing is configured.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            None => Ok(ProviderId::Power),
            Some(s) => ProviderId::try_from(s),
        }
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Variables every request should fetch and evaluate.
    pub fn tracked_variables(&self) -> Vec<Variable> {
        let mut variables = Variable::core().to_vec();
        if self.track_aerosol {
            variables.push(Variable::Aerosol);
        }
        variables
    }

    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            half_width: self.window_days,
            threshold: self.forecast_threshold,
            days: self.forecast_days,
        }
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        self.default_provider_id()?;
        if !self.forecast_threshold.is_finite() {
            return Err(anyhow!("forecast_threshold must be a finite number"));
        }
        Ok(())
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-outlook", "outlook")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
