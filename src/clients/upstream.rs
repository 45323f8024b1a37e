use crate::clients::{fetch_json, send_for_body, ClientError, Upstream};
use crate::core::models::{ChargeEvent, PricePoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::ACCEPT;

/// Client of the ingestion service that both stores and serves price data.
pub struct UpstreamClient {
    http: reqwest::Client,
    prices_url: String,
    charging_url: String,
    key: String,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, prices_url: String, charging_url: String, key: String) -> Self {
        Self {
            http,
            prices_url,
            charging_url,
            key,
        }
    }
}

fn cache_query(offset_days: u32, date: Option<NaiveDate>) -> (&'static str, String) {
    match date {
        Some(date) => ("date", date.format("%Y-%m-%d").to_string()),
        None => ("ago", offset_days.to_string()),
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn fetch_cached_prices(
        &self,
        offset_days: u32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, ClientError> {
        let request = self
            .http
            .get(&self.prices_url)
            .query(&[cache_query(offset_days, date)])
            .header(ACCEPT, "application/json");

        let prices: Vec<PricePoint> = fetch_json(request, &self.prices_url).await?;
        tracing::debug!(n_prices = prices.len(), ?date, offset_days, "Fetched cached prices");
        Ok(prices)
    }

    async fn forward_prices(&self, prices: &[PricePoint]) -> Result<(), ClientError> {
        let request = self
            .http
            .post(&self.prices_url)
            .query(&[("authKey", self.key.as_str())])
            .header(ACCEPT, "application/json")
            .json(prices);

        send_for_body(request, &self.prices_url).await?;
        tracing::debug!(n_prices = prices.len(), "Forwarded prices upstream");
        Ok(())
    }

    async fn forward_charge_event(&self, event: &ChargeEvent) -> Result<(), ClientError> {
        let request = self
            .http
            .post(&self.charging_url)
            .query(&[("authKey", self.key.as_str())])
            .header(ACCEPT, "application/json")
            .json(event);

        send_for_body(request, &self.charging_url).await?;
        tracing::debug!(
            consumed_kwh = %event.consumed_kwh,
            hour = event.hour,
            "Forwarded charge event upstream"
        );
        Ok(())
    }
}
