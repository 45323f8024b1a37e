use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Poller {
    Price,
    Charger,
}

impl Poller {
    pub fn name(&self) -> &'static str {
        match self {
            Poller::Price => "PricePoller",
            Poller::Charger => "ChargerPoller",
        }
    }

    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        match self {
            Poller::Price => filter == "price" || filter == "pricepoller",
            Poller::Charger => filter == "charger" || filter == "chargerpoller",
        }
    }
}

/// Raw record from the day-ahead price feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceRecord {
    pub date_time: DateTime<FixedOffset>,
    pub price_with_tax: Decimal,
}

/// One hour of electricity price, as cached and forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "date", with = "wire_timestamp")]
    pub timestamp: NaiveDateTime,
    pub price: String,
    pub hour: u32,
}

impl PricePoint {
    /// Parsed price, `None` when the stored string is not a decimal.
    pub fn price_value(&self) -> Option<Decimal> {
        self.price.trim().parse().ok()
    }
}

impl From<&PriceRecord> for PricePoint {
    fn from(record: &PriceRecord) -> Self {
        Self {
            timestamp: record.date_time.naive_local(),
            price: record.price_with_tax.normalize().to_string(),
            hour: record.date_time.hour(),
        }
    }
}

pub fn map_price_records(records: &[PriceRecord]) -> Vec<PricePoint> {
    records.iter().map(PricePoint::from).collect()
}

/// Cumulative energy counter of the charger, in watt-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargerReading {
    #[serde(rename = "eto")]
    pub cumulative_energy: i64,
}

/// Energy consumed by the charger during one completed hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeEvent {
    #[serde(rename = "date", with = "wire_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "charged")]
    pub consumed_kwh: Decimal,
    pub hour: u32,
}

impl ChargeEvent {
    /// Builds the event for the hour preceding `now` from a watt-hour delta.
    pub fn for_completed_hour(now: NaiveDateTime, consumed_wh: i64) -> Self {
        let top_of_hour =
            now.date().and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(now.hour()));
        let timestamp = top_of_hour - TimeDelta::hours(1);

        Self {
            timestamp,
            consumed_kwh: Decimal::new(consumed_wh, 3).normalize(),
            hour: timestamp.hour(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerStatus {
    pub timestamp: NaiveDateTime,
    pub poller: Poller,
    pub success: bool,
    pub reason: String,
}

mod wire_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| raw.parse::<NaiveDateTime>())
            .map_err(serde::de::Error::custom)
    }
}
