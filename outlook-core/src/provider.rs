use crate::{
    Config,
    model::{RawHistory, RawRecord, Variable},
    provider::{file::FileProvider, power::PowerProvider},
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug, path::Path};

pub mod file;
pub mod power;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Power,
    File,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Power => "power",
            ProviderId::File => "file",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Power, ProviderId::File]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "power" => Ok(ProviderId::Power),
            "file" => Ok(ProviderId::File),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: power, file."
            )),
        }
    }
}

/// A daily history request for one point.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub variables: Vec<Variable>,
}

#[async_trait]
pub trait HistoryProvider: Send + Sync + Debug {
    /// Raw records per requested variable. Variables the provider could not
    /// supply are left out of the map.
    async fn fetch(&self, request: &HistoryRequest) -> anyhow::Result<RawHistory>;
}

/// Construct a provider from config. An explicit history file always wins.
///
/// `csv_variable` names the variable a CSV history file holds; it defaults to
/// precipitation and is ignored for JSON files and the network provider.
pub fn provider_from_config(
    config: &Config,
    file: Option<&Path>,
    csv_variable: Option<Variable>,
) -> anyhow::Result<Box<dyn HistoryProvider>> {
    if let Some(path) = file {
        let mut provider = FileProvider::new(path.to_path_buf());
        if let Some(variable) = csv_variable {
            provider = provider.with_csv_variable(variable);
        }
        return Ok(Box::new(provider));
    }

    let boxed: Box<dyn HistoryProvider> = match config.default_provider_id()? {
        ProviderId::Power => Box::new(PowerProvider::new(config.provider.clone())?),
        ProviderId::File => {
            return Err(anyhow!(
                "Default provider is 'file' but no history file was given.\n\
                 Hint: pass `--file <PATH>` or run `outlook configure`."
            ));
        }
    };

    Ok(boxed)
}

/// Substrings that identify a variable in loosely named provider keys.
fn key_hints(variable: Variable) -> &'static [&'static str] {
    match variable {
        Variable::Temperature => &["t2m", "temp", "air_temperature"],
        Variable::Precipitation => &["prec"],
        Variable::Wind => &["ws2m", "wind", "ws"],
        Variable::Aerosol => &["aod", "aerosol"],
    }
}

/// Picks the response key that best matches `variable`: an exact
/// (case-insensitive) candidate name first, then the first key containing a hint.
pub fn select_key<'a, I>(keys: I, variable: Variable) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let keys: Vec<&str> = keys.into_iter().collect();

    for candidate in variable.power_candidates() {
        if let Some(key) = keys.iter().find(|k| k.eq_ignore_ascii_case(candidate)) {
            return Some(*key);
        }
    }

    key_hints(variable).iter().find_map(|hint| {
        keys.iter()
            .find(|k| k.to_lowercase().contains(hint))
            .copied()
    })
}

/// Records for `variable` from a POWER-style JSON document
/// (`properties.parameter.<KEY>.<YYYYMMDD> = value`).
pub fn extract_records(document: &Value, variable: Variable) -> Option<Vec<RawRecord>> {
    let parameters = document.get("properties")?.get("parameter")?.as_object()?;
    let key = select_key(parameters.keys().map(String::as_str), variable)?;
    let days = parameters.get(key)?.as_object()?;

    Some(
        days.iter()
            .map(|(key, value)| RawRecord { key: key.clone(), value: value.clone() })
            .collect(),
    )
}

pub(crate) fn extract_history(document: &Value, variables: &[Variable]) -> RawHistory {
    variables
        .iter()
        .filter_map(|&variable| extract_records(document, variable).map(|r| (variable, r)))
        .collect()
}
