use crate::clients::{
    build_http_client, build_notifier, ChargerClient, SpotPriceClient, UpstreamClient,
};
use crate::core::ledger::{combined, Retention, StatusLedger};
use crate::core::models::{Poller, PollerStatus, PricePoint};
use crate::core::settings::Settings;
use crate::core::shutdown::Shutdown;
use crate::core::store::{PriceSlot, PriceStore};
use crate::daemon::charger::ChargerPoller;
use crate::daemon::price::{PricePoller, PriceSchedule};
use crate::daemon::server;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Read-only view of the pollers' caches and ledgers.
#[derive(Clone)]
pub struct QueryHandle {
    store: PriceStore,
    price_ledger: StatusLedger,
    charger_ledger: StatusLedger,
}

impl QueryHandle {
    pub fn new(store: PriceStore, price_ledger: StatusLedger, charger_ledger: StatusLedger) -> Self {
        Self {
            store,
            price_ledger,
            charger_ledger,
        }
    }

    pub async fn prices(&self, slot: PriceSlot) -> Arc<Vec<PricePoint>> {
        self.store.get(slot).await
    }

    /// Price ledger entries followed by charger ledger entries.
    pub async fn status(&self) -> Vec<PollerStatus> {
        combined(&[self.price_ledger.clone(), self.charger_ledger.clone()]).await
    }
}

pub struct Orchestrator {
    price: PricePoller,
    charger: ChargerPoller,
    query: QueryHandle,
    retention: Retention,
    check_interval: Duration,
    address: String,
}

impl Orchestrator {
    pub fn new(
        price: PricePoller,
        charger: ChargerPoller,
        query: QueryHandle,
        retention: Retention,
        check_interval: Duration,
        address: String,
    ) -> Self {
        Self {
            price,
            charger,
            query,
            retention,
            check_interval,
            address,
        }
    }

    /// Wires the HTTP clients and both pollers from configuration.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = build_http_client(settings.polling.request_timeout())
            .context("Failed to build HTTP client")?;

        let feed = Arc::new(SpotPriceClient::new(
            http.clone(),
            settings.prices.today_url.clone().unwrap_or_default(),
            settings.prices.tomorrow_url.clone().unwrap_or_default(),
        ));
        let charger_source = Arc::new(ChargerClient::new(
            http.clone(),
            settings.charger.url.clone().unwrap_or_default(),
        ));
        let upstream = Arc::new(UpstreamClient::new(
            http.clone(),
            settings.upstream.prices_url.clone().unwrap_or_default(),
            settings.upstream.charging_url.clone().unwrap_or_default(),
            settings.upstream.key.clone(),
        ));
        let notifier =
            build_notifier(&settings.notifier, http).context("Failed to configure notifier")?;

        let store = PriceStore::new();
        let price_ledger = StatusLedger::new(Poller::Price);
        let charger_ledger = StatusLedger::new(Poller::Charger);

        let price = PricePoller::new(
            feed,
            upstream.clone(),
            notifier,
            store.clone(),
            price_ledger.clone(),
            PriceSchedule::from_settings(settings),
        );
        let charger = ChargerPoller::new(
            charger_source,
            upstream,
            charger_ledger.clone(),
            settings.polling.charger_retry(),
            settings.polling.charger_interval(),
        );

        Ok(Self::new(
            price,
            charger,
            QueryHandle::new(store, price_ledger, charger_ledger),
            settings.ledger.retention(),
            settings.ledger.check_interval(),
            settings.server.address(),
        ))
    }

    pub fn query(&self) -> QueryHandle {
        self.query.clone()
    }

    /// Runs both pollers, ledger compaction and the query server until
    /// `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind query server to {}", self.address))?;

        let price_task = tokio::spawn(self.price.run(shutdown.clone()));
        let charger_task = tokio::spawn(self.charger.run(shutdown.clone()));

        for ledger in [&self.query.price_ledger, &self.query.charger_ledger] {
            tokio::spawn(ledger.clone().run_compaction(
                self.retention,
                self.check_interval,
                shutdown.clone(),
            ));
        }

        let server_task = tokio::spawn(server::serve(listener, self.query.clone(), shutdown));

        let (price, charger) = tokio::join!(price_task, charger_task);
        for (poller, result) in [(Poller::Price, price), (Poller::Charger, charger)] {
            if let Err(e) = result {
                tracing::error!(poller = poller.name(), error = %e, "Poller task ended abnormally");
            }
        }

        match server_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Query server failed"),
            Err(e) => tracing::error!(error = %e, "Query server task ended abnormally"),
        }

        tracing::info!("All pollers stopped");
        Ok(())
    }
}
