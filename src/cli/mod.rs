pub mod check_config;
pub mod prices;
pub mod status;

use crate::core::settings::Settings;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// GETs `path` from the running daemon's query server.
async fn daemon_get<T: DeserializeOwned>(settings: &Settings, path: &str) -> Result<T> {
    let url = format!("{}{}", settings.server.base_url(), path);
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let response = http
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach daemon at {url} - is it running?"))?
        .error_for_status()
        .with_context(|| format!("Daemon rejected request to {url}"))?;

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse response from {url}"))
}
