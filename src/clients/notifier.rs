use crate::clients::{send_for_body, ClientError, Notifier};
use crate::core::models::PricePoint;
use crate::core::notifications::{format_price_alert, send_desktop_price_alert};
use async_trait::async_trait;
use reqwest::header::ACCEPT;

/// Posts alerts to a chat-bot relay endpoint.
pub struct RelayNotifier {
    http: reqwest::Client,
    url: String,
    key: String,
}

impl RelayNotifier {
    pub fn new(http: reqwest::Client, url: String, key: String) -> Self {
        Self { http, url, key }
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
    async fn notify(&self, sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<(), ClientError> {
        let message = format_price_alert(prices);
        let admin = urgent.to_string();
        let request = self
            .http
            .post(&self.url)
            .query(&[
                ("message", message.as_str()),
                ("from", sender),
                ("admin", admin.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .json(&self.key);

        send_for_body(request, &self.url).await?;
        tracing::info!(sender, urgent, n_prices = prices.len(), "Sent price alert to relay");
        Ok(())
    }
}

pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<(), ClientError> {
        let sender = sender.to_string();
        let prices = prices.to_vec();

        tokio::task::spawn_blocking(move || send_desktop_price_alert(&sender, urgent, &prices))
            .await
            .map_err(|e| ClientError::Notification(e.to_string()))?
            .map_err(|e| ClientError::Notification(e.to_string()))
    }
}

/// Only logs the alert, for installs without a notification channel.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<(), ClientError> {
        tracing::warn!(
            sender,
            urgent,
            prices = %format_price_alert(prices),
            "High price alert (notifier disabled)"
        );
        Ok(())
    }
}
