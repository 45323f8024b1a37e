use crate::clients::{ChargerSource, ClientError, Upstream};
use crate::core::ledger::StatusLedger;
use crate::core::models::ChargeEvent;
use crate::core::retry::{RetryDecision, RetryPolicy};
use crate::core::shutdown::Shutdown;
use crate::daemon::polling::HourEdge;
use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("implausible charger reading {reading} (last reading {last})")]
    ImplausibleReading { reading: i64, last: i64 },
}

/// Samples the charger's energy counter once per hour and forwards the
/// consumption of the hour just completed.
pub struct ChargerPoller {
    source: Arc<dyn ChargerSource>,
    upstream: Arc<dyn Upstream>,
    ledger: StatusLedger,
    retry: RetryPolicy,
    interval: Duration,
    edge: HourEdge,
    last_reading: i64,
    initial_poll: bool,
}

impl ChargerPoller {
    pub fn new(
        source: Arc<dyn ChargerSource>,
        upstream: Arc<dyn Upstream>,
        ledger: StatusLedger,
        retry: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            upstream,
            ledger,
            retry,
            interval,
            edge: HourEdge::new(),
            last_reading: 0,
            initial_poll: true,
        }
    }

    /// Fetches one reading and forwards the delta to the previous one.
    ///
    /// The first successful reading only sets the baseline.
    pub async fn collect(&mut self, now: NaiveDateTime) -> Result<(), CollectError> {
        self.collect_at(now, now).await
    }

    /// Like [`Self::collect`], but ledger entries are stamped with `recorded`
    /// while the charge event still belongs to the hour before `tick`.
    async fn collect_at(&mut self, tick: NaiveDateTime, recorded: NaiveDateTime) -> Result<(), CollectError> {
        let reading = self.source.fetch_reading().await?.cumulative_energy;

        if !self.initial_poll {
            if reading < self.last_reading || reading == 0 {
                return Err(CollectError::ImplausibleReading {
                    reading,
                    last: self.last_reading,
                });
            }

            if reading > self.last_reading {
                let event = ChargeEvent::for_completed_hour(tick, reading - self.last_reading);
                match self.upstream.forward_charge_event(&event).await {
                    Ok(()) => tracing::info!(
                        consumed_kwh = %event.consumed_kwh,
                        hour = event.hour,
                        "Forwarded charge event"
                    ),
                    Err(e) => {
                        self.ledger
                            .record_at(recorded, false, format!("Failed to forward charge event: {e}"))
                            .await;
                    }
                }
            }
        }

        self.ledger
            .record_at(recorded, true, format!("Got charger reading {reading}"))
            .await;
        self.last_reading = reading;
        self.initial_poll = false;
        Ok(())
    }

    /// Runs [`Self::collect`] under the retry policy. Returns whether a
    /// reading was collected.
    ///
    /// Each attempt is stamped with `now` plus the backoff waited so far.
    pub async fn collect_with_retry(&mut self, now: NaiveDateTime, shutdown: &mut Shutdown) -> bool {
        let mut retry = self.retry.start();
        let mut attempted_at = now;

        loop {
            let attempt = retry.next_attempt();
            let Err(e) = self.collect_at(now, attempted_at).await else {
                return true;
            };

            tracing::debug!(attempt, error = %e, "Charger collection attempt failed");
            self.ledger
                .record_at(
                    attempted_at,
                    false,
                    format!("Attempt {attempt}/{} failed: {e}", retry.max_attempts()),
                )
                .await;

            match retry.record_failure() {
                RetryDecision::RetryAfter(delay) => {
                    if !shutdown.sleep(delay).await {
                        return false;
                    }
                    attempted_at = TimeDelta::from_std(delay)
                        .ok()
                        .and_then(|waited| attempted_at.checked_add_signed(waited))
                        .unwrap_or(attempted_at);
                }
                RetryDecision::Exhausted => {
                    self.ledger
                        .record_at(
                            attempted_at,
                            false,
                            format!("Charger collection failed after {} attempts", retry.attempts()),
                        )
                        .await;
                    return false;
                }
            }
        }
    }

    /// One iteration of the main loop; collects only on an hour edge.
    pub async fn tick(&mut self, now: NaiveDateTime, shutdown: &mut Shutdown) {
        let previous = self.edge.last_hour();
        if self.edge.fires(now.hour()) {
            tracing::debug!(hour = now.hour(), ?previous, "Hour changed, collecting charger reading");
            self.collect_with_retry(now, shutdown).await;
        }
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        tracing::info!(interval = ?self.interval, "Starting charger poller");

        while !shutdown.is_triggered() {
            let mut tick_shutdown = shutdown.clone();
            tokio::select! {
                _ = self.tick(Local::now().naive_local(), &mut tick_shutdown) => {}
                _ = shutdown.triggered() => break,
            }

            if !shutdown.sleep(self.interval).await {
                break;
            }
        }

        tracing::info!("Charger poller stopped");
    }
}
