use crate::clients::{fetch_json, ChargerSource, ClientError};
use crate::core::models::ChargerReading;
use async_trait::async_trait;
use reqwest::header::ACCEPT;

pub struct ChargerClient {
    http: reqwest::Client,
    url: String,
}

impl ChargerClient {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl ChargerSource for ChargerClient {
    async fn fetch_reading(&self) -> Result<ChargerReading, ClientError> {
        let request = self.http.get(&self.url).header(ACCEPT, "application/json");
        let reading: ChargerReading = fetch_json(request, &self.url).await?;
        tracing::debug!(reading = reading.cumulative_energy, "Fetched charger reading");
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::build_http_client;
    use mockito::Server;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_reading_asks_for_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(r#"{"eto": 1234567, "car": 2}"#)
            .create_async()
            .await;

        let client = ChargerClient::new(
            build_http_client(Duration::from_secs(5)).unwrap(),
            format!("{}/api/status", server.url()),
        );
        let reading = client.fetch_reading().await.unwrap();

        assert_eq!(reading.cumulative_energy, 1_234_567);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reading_without_counter_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_body(r#"{"car": 2}"#)
            .create_async()
            .await;

        let client = ChargerClient::new(
            build_http_client(Duration::from_secs(5)).unwrap(),
            format!("{}/api/status", server.url()),
        );

        assert!(matches!(
            client.fetch_reading().await,
            Err(ClientError::Decode { .. })
        ));
    }
}
