mod charger;
mod error;
#[cfg(test)]
pub mod fake;
mod notifier;
mod spot;
mod upstream;

use crate::core::models::{ChargeEvent, ChargerReading, PricePoint, PriceRecord};
use crate::core::settings::{NotifierKind, NotifierSettings};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub use charger::ChargerClient;
pub use error::ClientError;
pub use notifier::{DesktopNotifier, LogNotifier, RelayNotifier};
pub use spot::SpotPriceClient;
pub use upstream::UpstreamClient;

/// Day-ahead electricity price feed.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_today(&self) -> Result<Vec<PriceRecord>, ClientError>;
    async fn fetch_tomorrow(&self) -> Result<Vec<PriceRecord>, ClientError>;
}

#[async_trait]
pub trait ChargerSource: Send + Sync {
    async fn fetch_reading(&self) -> Result<ChargerReading, ClientError>;
}

/// Ingestion service that stores forwarded data and serves it back as a cache.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Prices already published upstream. An explicit `date` takes precedence
    /// over `offset_days`.
    async fn fetch_cached_prices(
        &self,
        offset_days: u32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, ClientError>;

    async fn forward_prices(&self, prices: &[PricePoint]) -> Result<(), ClientError>;

    async fn forward_charge_event(&self, event: &ChargeEvent) -> Result<(), ClientError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<(), ClientError>;
}

/// Shared HTTP client; every request carries `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("electric-eye/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::Build)
}

pub fn build_notifier(
    settings: &NotifierSettings,
    http: reqwest::Client,
) -> Result<Arc<dyn Notifier>, ClientError> {
    let notifier: Arc<dyn Notifier> = match settings.kind {
        NotifierKind::Relay => {
            let url = settings
                .url
                .clone()
                .ok_or_else(|| ClientError::Notification("notifier.url is not configured".to_string()))?;
            Arc::new(RelayNotifier::new(http, url, settings.key.clone()))
        }
        NotifierKind::Desktop => Arc::new(DesktopNotifier),
        NotifierKind::Disabled => Arc::new(LogNotifier),
    };
    Ok(notifier)
}

/// Sends `request` and returns the body of a successful response.
async fn send_for_body(request: reqwest::RequestBuilder, url: &str) -> Result<String, ClientError> {
    let response = request.send().await.map_err(|source| ClientError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }

    response.text().await.map_err(|source| ClientError::Request {
        url: url.to_string(),
        source,
    })
}

async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, ClientError> {
    let body = send_for_body(request, url).await?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}
