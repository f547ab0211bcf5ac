use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::model::{RawHistory, RawRecord, Variable};
use crate::provider::{HistoryRequest, extract_history, extract_records};
use crate::series::KEY_FORMAT;

use super::HistoryProvider;

/// NASA POWER daily point endpoint.
#[derive(Debug, Clone)]
pub struct PowerProvider {
    config: ProviderConfig,
    http: Client,
}

impl PowerProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("outlook/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for NASA POWER")?;

        Ok(Self { config, http })
    }

    async fn fetch_document(&self, request: &HistoryRequest, parameters: &str) -> Result<Value> {
        let start = request.start.format(KEY_FORMAT).to_string();
        let end = request.end.format(KEY_FORMAT).to_string();
        let latitude = request.latitude.to_string();
        let longitude = request.longitude.to_string();

        let mut req = self.http.get(&self.config.base_url).query(&[
            ("parameters", parameters),
            ("community", "AG"),
            ("longitude", longitude.as_str()),
            ("latitude", latitude.as_str()),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("format", "JSON"),
        ]);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }

        let res = req
            .send()
            .await
            .context("Failed to send request to NASA POWER")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read NASA POWER response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "NASA POWER request for {} failed with status {}: {}",
                parameters,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse NASA POWER JSON")
    }

    /// Tries each candidate name for `variable` on its own until one yields records.
    async fn fetch_single(
        &self,
        request: &HistoryRequest,
        variable: Variable,
    ) -> Option<Vec<RawRecord>> {
        for candidate in variable.power_candidates() {
            match self.fetch_document(request, candidate).await {
                Ok(doc) => match extract_records(&doc, variable) {
                    Some(records) => return Some(records),
                    None => debug!("POWER returned no {candidate} data for {variable}"),
                },
                Err(err) => debug!("POWER fallback {candidate} for {variable} failed: {err:#}"),
            }
        }
        None
    }
}

/// All candidate names for the requested variables, sorted and deduplicated.
fn combined_parameters(variables: &[Variable]) -> String {
    let names: BTreeSet<&str> = variables
        .iter()
        .flat_map(|v| v.power_candidates().iter().copied())
        .collect();
    names.into_iter().collect::<Vec<_>>().join(",")
}

#[async_trait]
impl HistoryProvider for PowerProvider {
    async fn fetch(&self, request: &HistoryRequest) -> Result<RawHistory> {
        info!(
            "fetching POWER history at ({}, {}) from {} to {}",
            request.latitude, request.longitude, request.start, request.end
        );

        let mut history = match self
            .fetch_document(request, &combined_parameters(&request.variables))
            .await
        {
            Ok(doc) => extract_history(&doc, &request.variables),
            Err(err) => {
                warn!("combined POWER request failed, retrying per variable: {err:#}");
                RawHistory::new()
            }
        };

        for &variable in &request.variables {
            if history.contains_key(&variable) {
                continue;
            }
            if let Some(records) = self.fetch_single(request, variable).await {
                history.insert(variable, records);
            } else {
                warn!("POWER has no data for {variable}");
            }
        }

        Ok(history)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
