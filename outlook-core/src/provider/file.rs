use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;
use serde_json::Value;

use crate::model::{RawHistory, RawRecord, Variable};
use crate::provider::{HistoryRequest, extract_history};
use crate::series::KEY_FORMAT;

use super::HistoryProvider;

/// History loaded from a local file instead of the network.
///
/// JSON files are read as saved POWER responses. Anything else is read as
/// CSV, one day per row, either `YYYYMMDD,value` or `year,day_of_year,...,value`.
/// CSV rows carry a single variable.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
    csv_variable: Variable,
}

impl FileProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            csv_variable: Variable::Precipitation,
        }
    }

    pub fn with_csv_variable(mut self, variable: Variable) -> Self {
        self.csv_variable = variable;
        self
    }

    fn is_json(&self, contents: &str) -> bool {
        let by_extension = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        by_extension || contents.trim_start().starts_with('{')
    }
}

fn csv_row_to_record(row: &StringRecord) -> Option<RawRecord> {
    let cells: Vec<&str> = row.iter().filter(|c| !c.is_empty()).collect();
    if cells.len() < 2 {
        return None;
    }

    let first = cells[0];
    if first.len() == 8 && first.bytes().all(|b| b.is_ascii_digit()) {
        return Some(RawRecord {
            key: first.to_string(),
            value: Value::String(cells[1].to_string()),
        });
    }

    let year: i32 = first.parse().ok()?;
    let day: i64 = cells[1].parse().ok()?;
    let offset = Duration::try_days(day.checked_sub(1)?)?;
    let date = NaiveDate::from_ymd_opt(year, 1, 1)?.checked_add_signed(offset)?;
    let value = cells.last()?;

    Some(RawRecord {
        key: date.format(KEY_FORMAT).to_string(),
        value: Value::String(value.to_string()),
    })
}

pub(crate) fn parse_csv(contents: &str) -> Vec<RawRecord> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(contents.as_bytes())
        .records()
        .filter_map(|row| row.ok())
        .filter_map(|row| csv_row_to_record(&row))
        .collect()
}

#[async_trait]
impl HistoryProvider for FileProvider {
    async fn fetch(&self, request: &HistoryRequest) -> Result<RawHistory> {
        info!("loading history from {}", self.path.display());

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read history file: {}", self.path.display()))?;

        if self.is_json(&contents) {
            let document: Value = serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse history JSON: {}", self.path.display())
            })?;
            return Ok(extract_history(&document, &request.variables));
        }

        let records = parse_csv(&contents);
        if records.is_empty() {
            return Err(anyhow!(
                "Failed to parse local CSV: {} contains no dated rows",
                self.path.display()
            ));
        }

        let mut history = RawHistory::new();
        if request.variables.contains(&self.csv_variable) {
            history.insert(self.csv_variable, records);
        }
        Ok(history)
    }
}
