use crate::clients::{ClientError, Notifier, PriceFeed, Upstream};
use crate::core::ledger::StatusLedger;
use crate::core::models::{map_price_records, PricePoint};
use crate::core::notifications::first_above_threshold;
use crate::core::settings::Settings;
use crate::core::shutdown::Shutdown;
use crate::core::store::{PriceSlot, PriceStore};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const HEARTBEAT: &str = "Running in the polling loop";

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("price feed returned no {} prices", .0.label())]
    Empty(PriceSlot),
}

#[derive(Debug, Clone)]
pub struct PriceSchedule {
    /// Wall-clock hour at which the daily update runs.
    pub polling_hour: u32,
    pub threshold: Decimal,
    pub interval: Duration,
    pub sender: String,
    pub urgent: bool,
}

impl PriceSchedule {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            polling_hour: settings.polling.price_hour,
            threshold: settings.polling.price_threshold,
            interval: settings.polling.price_interval(),
            sender: settings.notifier.sender.clone(),
            urgent: settings.notifier.urgent,
        }
    }
}

/// Keeps the current and tomorrow price caches fresh and alerts once a day
/// when tomorrow holds an expensive hour.
pub struct PricePoller {
    feed: Arc<dyn PriceFeed>,
    upstream: Arc<dyn Upstream>,
    notifier: Arc<dyn Notifier>,
    store: PriceStore,
    ledger: StatusLedger,
    schedule: PriceSchedule,
    today: Option<NaiveDate>,
    alert_sent: bool,
}

impl PricePoller {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        upstream: Arc<dyn Upstream>,
        notifier: Arc<dyn Notifier>,
        store: PriceStore,
        ledger: StatusLedger,
        schedule: PriceSchedule,
    ) -> Self {
        Self {
            feed,
            upstream,
            notifier,
            store,
            ledger,
            schedule,
            today: None,
            alert_sent: true,
        }
    }

    /// Seeds both caches from the upstream service, falling back to a full
    /// fetch for any slot the upstream has nothing for.
    pub async fn initialize(&mut self, now: NaiveDateTime) {
        for slot in [PriceSlot::Current, PriceSlot::Tomorrow] {
            if let Err(e) = self.initialize_slot(slot, now).await {
                self.ledger
                    .record_at(now, false, format!("Failed to initialize {} prices: {e}", slot.label()))
                    .await;
            }
        }
    }

    async fn initialize_slot(&mut self, slot: PriceSlot, now: NaiveDateTime) -> Result<(), UpdateError> {
        let date = match slot {
            PriceSlot::Current => None,
            PriceSlot::Tomorrow => now.date().succ_opt(),
        };

        let cached = self.upstream.fetch_cached_prices(0, date).await?;
        if cached.is_empty() {
            tracing::info!(slot = slot.label(), "No cached prices upstream, fetching from feed");
            return match slot {
                PriceSlot::Current => self.update_today(now).await,
                PriceSlot::Tomorrow => self.update_tomorrow(now).await,
            };
        }

        let count = cached.len();
        self.store.replace(slot, cached).await;
        self.ledger
            .record_at(now, true, format!("Loaded {count} cached {} prices", slot.label()))
            .await;
        Ok(())
    }

    /// One iteration of the main loop.
    pub async fn tick(&mut self, now: NaiveDateTime) {
        let today = now.date();
        if self.today != Some(today) {
            tracing::debug!(%today, "New day, clearing price alert flag");
            self.today = Some(today);
            self.alert_sent = false;
        }

        self.ledger.record_at(now, true, HEARTBEAT).await;

        if now.hour() == self.schedule.polling_hour && !self.alert_sent {
            if let Err(e) = self.update_prices(now).await {
                self.ledger
                    .record_at(now, false, format!("Price update failed: {e}"))
                    .await;
            }
            self.alert_sent = true;
        }
    }

    async fn update_prices(&mut self, now: NaiveDateTime) -> Result<(), UpdateError> {
        self.update_today(now).await?;
        self.update_tomorrow(now).await
    }

    async fn update_today(&mut self, now: NaiveDateTime) -> Result<(), UpdateError> {
        let records = self.feed.fetch_today().await?;
        let prices = map_price_records(&records);
        if prices.is_empty() {
            return Err(UpdateError::Empty(PriceSlot::Current));
        }

        self.store.replace(PriceSlot::Current, prices.clone()).await;
        self.upstream.forward_prices(&prices).await?;
        self.ledger
            .record_at(now, true, format!("Got {} current prices", prices.len()))
            .await;
        Ok(())
    }

    async fn update_tomorrow(&mut self, now: NaiveDateTime) -> Result<(), UpdateError> {
        let records = self.feed.fetch_tomorrow().await?;
        let prices = map_price_records(&records);
        if prices.is_empty() {
            return Err(UpdateError::Empty(PriceSlot::Tomorrow));
        }

        self.store.replace(PriceSlot::Tomorrow, prices.clone()).await;

        if !self.alert_sent {
            self.alert_if_expensive(now, &prices).await;
            self.alert_sent = true;
        }

        self.upstream.forward_prices(&prices).await?;
        self.ledger
            .record_at(now, true, format!("Got {} tomorrow prices", prices.len()))
            .await;
        Ok(())
    }

    async fn alert_if_expensive(&self, now: NaiveDateTime, prices: &[PricePoint]) {
        let Some(trigger) = first_above_threshold(prices, self.schedule.threshold) else {
            return;
        };

        tracing::info!(
            hour = trigger.hour,
            price = %trigger.price,
            threshold = %self.schedule.threshold,
            "Tomorrow's price exceeds threshold"
        );

        if let Err(e) = self
            .notifier
            .notify(&self.schedule.sender, self.schedule.urgent, prices)
            .await
        {
            self.ledger
                .record_at(now, false, format!("Failed to send price alert: {e}"))
                .await;
        }
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        tracing::info!(
            polling_hour = self.schedule.polling_hour,
            interval = ?self.schedule.interval,
            "Starting price poller"
        );

        tokio::select! {
            _ = self.initialize(Local::now().naive_local()) => {}
            _ = shutdown.triggered() => return,
        }

        while !shutdown.is_triggered() {
            tokio::select! {
                _ = self.tick(Local::now().naive_local()) => {}
                _ = shutdown.triggered() => break,
            }

            if !shutdown.sleep(self.schedule.interval).await {
                break;
            }
        }

        tracing::info!("Price poller stopped");
    }
}
