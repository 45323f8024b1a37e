use crate::clients::{fetch_json, ClientError, PriceFeed};
use crate::core::models::PriceRecord;
use async_trait::async_trait;

pub struct SpotPriceClient {
    http: reqwest::Client,
    today_url: String,
    tomorrow_url: String,
}

impl SpotPriceClient {
    pub fn new(http: reqwest::Client, today_url: String, tomorrow_url: String) -> Self {
        Self {
            http,
            today_url,
            tomorrow_url,
        }
    }

    async fn collect(&self, url: &str) -> Result<Vec<PriceRecord>, ClientError> {
        tracing::debug!(%url, "Collecting spot prices");
        let records: Vec<PriceRecord> = fetch_json(self.http.get(url), url).await?;
        tracing::debug!(%url, n_records = records.len(), "Collected spot prices");
        Ok(records)
    }
}

#[async_trait]
impl PriceFeed for SpotPriceClient {
    async fn fetch_today(&self) -> Result<Vec<PriceRecord>, ClientError> {
        self.collect(&self.today_url).await
    }

    async fn fetch_tomorrow(&self) -> Result<Vec<PriceRecord>, ClientError> {
        self.collect(&self.tomorrow_url).await
    }
}
