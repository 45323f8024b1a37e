use crate::core::models::{Poller, PollerStatus};
use crate::core::shutdown::Shutdown;
use chrono::{Datelike, Local, NaiveDateTime, TimeDelta, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// When the compaction task discards ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Clear everything whenever a check lands on `day` at `hour`.
    Monthly { day: u32, hour: u32 },
    /// Keep only entries younger than `window`.
    Rolling { window: TimeDelta },
}

/// Append-only health log of a single poller.
///
/// Cloning shares the underlying log. Readers get a copy, never a reference.
#[derive(Clone)]
pub struct StatusLedger {
    poller: Poller,
    entries: Arc<RwLock<Vec<PollerStatus>>>,
}

impl StatusLedger {
    pub fn new(poller: Poller) -> Self {
        Self {
            poller,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn record_at(&self, timestamp: NaiveDateTime, success: bool, reason: impl Into<String>) {
        let reason = reason.into();
        if success {
            tracing::info!(poller = self.poller.name(), %reason, "Poller status");
        } else {
            tracing::warn!(poller = self.poller.name(), %reason, "Poller failure");
        }

        self.entries.write().await.push(PollerStatus {
            timestamp,
            poller: self.poller,
            success,
            reason,
        });
    }

    pub async fn snapshot(&self) -> Vec<PollerStatus> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Applies `retention` as of `now` and returns how many entries were dropped.
    pub async fn compact(&self, retention: Retention, now: NaiveDateTime) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        match retention {
            Retention::Monthly { day, hour } => {
                if now.day() == day && now.hour() == hour {
                    entries.clear();
                }
            }
            Retention::Rolling { window } => {
                // A window reaching past the calendar's start keeps everything.
                if let Some(cutoff) = now.checked_sub_signed(window) {
                    entries.retain(|entry| entry.timestamp >= cutoff);
                }
            }
        }

        before - entries.len()
    }

    pub async fn run_compaction(self, retention: Retention, interval: Duration, mut shutdown: Shutdown) {
        tracing::debug!(poller = self.poller.name(), ?retention, "Starting ledger compaction");

        while !shutdown.is_triggered() {
            let removed = self.compact(retention, Local::now().naive_local()).await;
            if removed > 0 {
                let remaining = self.len().await;
                tracing::info!(
                    poller = self.poller.name(),
                    removed,
                    remaining,
                    "Compacted status ledger"
                );
            }

            if !shutdown.sleep(interval).await {
                break;
            }
        }

        tracing::debug!(poller = self.poller.name(), "Ledger compaction stopped");
    }
}

/// Concatenates ledgers in the given order.
pub async fn combined(ledgers: &[StatusLedger]) -> Vec<PollerStatus> {
    let mut all = Vec::new();
    for ledger in ledgers {
        all.extend(ledger.snapshot().await);
    }
    all
}
