use crate::core::models::{PollerStatus, PricePoint};
use crate::core::shutdown::Shutdown;
use crate::core::store::PriceSlot;
use crate::daemon::app::QueryHandle;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct PricesParams {
    current: Option<bool>,
}

pub fn create_router(query: QueryHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/prices", get(prices))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(query)
}

pub async fn serve(listener: TcpListener, query: QueryHandle, mut shutdown: Shutdown) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Query server listening");
    }

    axum::serve(listener, create_router(query))
        .with_graceful_shutdown(async move { shutdown.triggered().await })
        .await?;

    tracing::info!("Query server stopped");
    Ok(())
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn prices(
    State(query): State<QueryHandle>,
    Query(params): Query<PricesParams>,
) -> Json<Vec<PricePoint>> {
    let slot = if params.current.unwrap_or(true) {
        PriceSlot::Current
    } else {
        PriceSlot::Tomorrow
    };
    Json(query.prices(slot).await.to_vec())
}

async fn status(State(query): State<QueryHandle>) -> Json<Vec<PollerStatus>> {
    Json(query.status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::StatusLedger;
    use crate::core::models::Poller;
    use crate::core::store::PriceStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::ServiceExt;

    fn point(hour: u32, price: &str) -> PricePoint {
        PricePoint {
            timestamp: NaiveDate::from_ymd_opt(2026, 8, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            price: price.to_string(),
            hour,
        }
    }

    async fn query_handle() -> QueryHandle {
        let store = PriceStore::new();
        store.replace(PriceSlot::Current, vec![point(0, "0.02"), point(1, "0.03")]).await;
        store.replace(PriceSlot::Tomorrow, vec![point(7, "0.2")]).await;

        let price = StatusLedger::new(Poller::Price);
        let charger = StatusLedger::new(Poller::Charger);
        let now = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        charger.record_at(now, true, "Got charger reading 100").await;
        price.record_at(now, false, "Price update failed").await;

        QueryHandle::new(store, price, charger)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(create_router(query_handle().await), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_prices_default_to_current() {
        let router = create_router(query_handle().await);

        let (status, body) = get_json(router.clone(), "/api/prices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["date"], "2026-08-01 00:00:00");
        assert_eq!(body[1]["price"], "0.03");

        let (_, body) = get_json(router, "/api/prices?current=false").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["hour"], 7);
    }

    #[tokio::test]
    async fn test_status_lists_price_ledger_first() {
        let (status, body) = get_json(create_router(query_handle().await), "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["poller"], "price");
        assert_eq!(entries[0]["success"], false);
        assert_eq!(entries[1]["poller"], "charger");
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let response = create_router(query_handle().await)
            .oneshot(
                Request::builder()
                    .uri("/api/prices?current=maybe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
