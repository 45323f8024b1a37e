//! In-memory collaborators for poller tests.

use crate::clients::{ChargerSource, ClientError, Notifier, PriceFeed, Upstream};
use crate::core::models::{ChargeEvent, ChargerReading, PricePoint, PriceRecord};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

fn unavailable(what: &str) -> ClientError {
    ClientError::Status {
        url: format!("fake://{what}"),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: String::new(),
    }
}

pub fn record(hour: u32, price: &str) -> PriceRecord {
    let offset = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
    PriceRecord {
        date_time: offset.with_ymd_and_hms(2026, 6, 2, hour, 0, 0).unwrap(),
        price_with_tax: Decimal::from_str(price).unwrap(),
    }
}

pub fn point(hour: u32, price: &str) -> PricePoint {
    PricePoint {
        timestamp: NaiveDate::from_ymd_opt(2026, 6, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
        price: price.to_string(),
        hour,
    }
}

/// `None` in a slot makes the corresponding fetch fail.
#[derive(Default)]
pub struct FakePriceFeed {
    pub today: Mutex<Option<Vec<PriceRecord>>>,
    pub tomorrow: Mutex<Option<Vec<PriceRecord>>>,
    pub calls: AtomicUsize,
}

impl FakePriceFeed {
    pub fn with(today: Vec<PriceRecord>, tomorrow: Vec<PriceRecord>) -> Self {
        Self {
            today: Mutex::new(Some(today)),
            tomorrow: Mutex::new(Some(tomorrow)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for FakePriceFeed {
    async fn fetch_today(&self) -> Result<Vec<PriceRecord>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.today.lock().unwrap().clone().ok_or_else(|| unavailable("today"))
    }

    async fn fetch_tomorrow(&self) -> Result<Vec<PriceRecord>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tomorrow
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable("tomorrow"))
    }
}

#[derive(Default)]
pub struct FakeUpstream {
    pub cached_current: Mutex<Option<Vec<PricePoint>>>,
    pub cached_tomorrow: Mutex<Option<Vec<PricePoint>>>,
    pub cache_requests: Mutex<Vec<(u32, Option<NaiveDate>)>>,
    pub forwarded_prices: Mutex<Vec<Vec<PricePoint>>>,
    pub events: Mutex<Vec<ChargeEvent>>,
    pub fail_forward: AtomicBool,
}

impl FakeUpstream {
    pub fn with_cache(current: Vec<PricePoint>, tomorrow: Vec<PricePoint>) -> Self {
        Self {
            cached_current: Mutex::new(Some(current)),
            cached_tomorrow: Mutex::new(Some(tomorrow)),
            ..Self::default()
        }
    }

    pub fn forwarded(&self) -> Vec<Vec<PricePoint>> {
        self.forwarded_prices.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<ChargeEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch_cached_prices(
        &self,
        offset_days: u32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, ClientError> {
        self.cache_requests.lock().unwrap().push((offset_days, date));
        let slot = if date.is_some() {
            &self.cached_tomorrow
        } else {
            &self.cached_current
        };
        slot.lock().unwrap().clone().ok_or_else(|| unavailable("cache"))
    }

    async fn forward_prices(&self, prices: &[PricePoint]) -> Result<(), ClientError> {
        if self.fail_forward.load(Ordering::SeqCst) {
            return Err(unavailable("forward"));
        }
        self.forwarded_prices.lock().unwrap().push(prices.to_vec());
        Ok(())
    }

    async fn forward_charge_event(&self, event: &ChargeEvent) -> Result<(), ClientError> {
        if self.fail_forward.load(Ordering::SeqCst) {
            return Err(unavailable("charging"));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Serves queued readings; `None` entries and an empty queue fail.
#[derive(Default)]
pub struct FakeCharger {
    pub readings: Mutex<VecDeque<Option<i64>>>,
    pub calls: AtomicUsize,
}

impl FakeCharger {
    pub fn with(readings: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reading: Option<i64>) {
        self.readings.lock().unwrap().push_back(reading);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChargerSource for FakeCharger {
    async fn fetch_reading(&self) -> Result<ChargerReading, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.readings.lock().unwrap().pop_front() {
            Some(Some(cumulative_energy)) => Ok(ChargerReading { cumulative_energy }),
            _ => Err(unavailable("charger")),
        }
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<(String, bool, Vec<PricePoint>)>>,
    pub fail: AtomicBool,
}

impl FakeNotifier {
    pub fn sent(&self) -> Vec<(String, bool, Vec<PricePoint>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, sender: &str, urgent: bool, prices: &[PricePoint]) -> Result<(), ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Notification("relay unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((sender.to_string(), urgent, prices.to_vec()));
        Ok(())
    }
}
