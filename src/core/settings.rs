use crate::core::ledger::Retention;
use crate::core::retry::RetryPolicy;
use anyhow::{Context, Result};
use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest rolling ledger window accepted, ten years.
pub const MAX_ROLLING_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub prices: PriceFeedSettings,
    pub charger: ChargerSettings,
    pub upstream: UpstreamSettings,
    pub notifier: NotifierSettings,
    pub polling: PollingSettings,
    pub ledger: LedgerSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceFeedSettings {
    pub today_url: Option<String>,
    pub tomorrow_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub prices_url: Option<String>,
    pub charging_url: Option<String>,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Relay,
    Desktop,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub kind: NotifierKind,
    pub url: Option<String>,
    pub key: String,
    pub sender: String,
    pub urgent: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Relay,
            url: None,
            key: String::new(),
            sender: "ElectricEye".to_string(),
            urgent: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub price_hour: u32,
    pub price_threshold: Decimal,
    pub price_interval_secs: u64,
    pub charger_interval_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            price_hour: 14,
            price_threshold: Decimal::new(1, 1),
            price_interval_secs: 30 * 60,
            charger_interval_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 30,
            request_timeout_secs: 30,
        }
    }
}

impl PollingSettings {
    pub fn price_interval(&self) -> Duration {
        Duration::from_secs(self.price_interval_secs)
    }

    pub fn charger_interval(&self) -> Duration {
        Duration::from_secs(self.charger_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn charger_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionKind {
    Monthly,
    Rolling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub retention: RetentionKind,
    pub trim_day: u32,
    pub trim_hour: u32,
    pub rolling_hours: i64,
    pub check_interval_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            retention: RetentionKind::Monthly,
            trim_day: 28,
            trim_hour: 23,
            rolling_hours: 30 * 24,
            check_interval_secs: 45 * 60,
        }
    }
}

impl LedgerSettings {
    pub fn retention(&self) -> Retention {
        match self.retention {
            RetentionKind::Monthly => Retention::Monthly {
                day: self.trim_day,
                hour: self.trim_hour,
            },
            RetentionKind::Rolling => Retention::Rolling {
                window: TimeDelta::try_hours(self.rolling_hours).unwrap_or(TimeDelta::MAX),
            },
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        let host = if self.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("http://{}:{}", host, self.port)
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("electric-eye").join("config.toml"))
    }

    /// Loads `path`, or the default location when `path` is `None`.
    ///
    /// A missing file is only tolerated at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path().context("Could not determine config directory")?;
                if !path.exists() {
                    tracing::info!(?path, "Config file not found, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let polling = &self.polling;
        if polling.price_hour > 23 {
            anyhow::bail!("polling.price_hour must be between 0 and 23, got {}", polling.price_hour);
        }
        if polling.price_threshold <= Decimal::ZERO {
            anyhow::bail!(
                "polling.price_threshold must be positive, got {}",
                polling.price_threshold
            );
        }
        if polling.retry_attempts == 0 {
            anyhow::bail!("polling.retry_attempts must be at least 1");
        }
        if polling.price_interval_secs == 0 || polling.charger_interval_secs == 0 {
            anyhow::bail!("polling intervals must be greater than zero");
        }
        if polling.request_timeout_secs == 0 {
            anyhow::bail!("polling.request_timeout_secs must be greater than zero");
        }

        let ledger = &self.ledger;
        if !(1..=31).contains(&ledger.trim_day) {
            anyhow::bail!("ledger.trim_day must be between 1 and 31, got {}", ledger.trim_day);
        }
        if ledger.trim_hour > 23 {
            anyhow::bail!("ledger.trim_hour must be between 0 and 23, got {}", ledger.trim_hour);
        }
        if ledger.rolling_hours <= 0 || ledger.rolling_hours > MAX_ROLLING_HOURS {
            anyhow::bail!(
                "ledger.rolling_hours must be between 1 and {}, got {}",
                MAX_ROLLING_HOURS,
                ledger.rolling_hours
            );
        }
        if ledger.check_interval_secs == 0 {
            anyhow::bail!("ledger.check_interval_secs must be greater than zero");
        }

        Ok(())
    }

    /// Checks that every endpoint the daemon talks to is configured.
    pub fn validate_endpoints(&self) -> Result<()> {
        let required = [
            ("prices.today_url", &self.prices.today_url),
            ("prices.tomorrow_url", &self.prices.tomorrow_url),
            ("charger.url", &self.charger.url),
            ("upstream.prices_url", &self.upstream.prices_url),
            ("upstream.charging_url", &self.upstream.charging_url),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            anyhow::bail!("Missing required settings: {}", missing.join(", "));
        }

        if self.notifier.kind == NotifierKind::Relay && self.notifier.url.is_none() {
            anyhow::bail!("notifier.url is required when notifier.kind = \"relay\"");
        }

        Ok(())
    }
}
