//! Runtime configuration shared by the terminal and web front ends.
//!
//! Defaults come first, then `TICKDASH_*` environment variables, then
//! whatever the binary's flags override.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::adapters::{SyntheticSource, YahooAdapter};
use crate::data_source::MarketDataSource;
use crate::fetcher::DataFetcher;
use crate::http_client::{HttpAuth, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::RetryConfig;
use crate::{ChartStyle, Period, Symbol, ValidationError};

pub const MIN_REFRESH_SECS: u64 = 10;
pub const MAX_REFRESH_SECS: u64 = 300;
pub const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub default_symbol: Symbol,
    pub default_period: Period,
    pub default_style: ChartStyle,
    pub refresh_interval: Duration,
    /// Serve deterministic synthetic data instead of calling Yahoo.
    pub offline: bool,
    pub yahoo_cookie: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryConfig::default(),
            default_symbol: Symbol::from_static("AAPL"),
            default_period: Period::OneMonth,
            default_style: ChartStyle::Candlestick,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            offline: false,
            yahoo_cookie: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "TICKDASH_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var::<u32>(&lookup, "TICKDASH_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "TICKDASH_REFRESH_SECS")? {
            config = config.with_refresh_secs(secs)?;
        }
        if let Some(value) = lookup("TICKDASH_OFFLINE") {
            config.offline = parse_flag("TICKDASH_OFFLINE", &value)?;
        }
        if let Some(symbol) = lookup("TICKDASH_DEFAULT_SYMBOL") {
            config.default_symbol = Symbol::parse(&symbol)?;
        }
        config.yahoo_cookie = lookup("YAHOO_COOKIE").filter(|cookie| !cookie.trim().is_empty());

        Ok(config)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_refresh_secs(mut self, secs: u64) -> Result<Self, ValidationError> {
        if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&secs) {
            return Err(ValidationError::RefreshIntervalOutOfRange {
                secs,
                min: MIN_REFRESH_SECS,
                max: MAX_REFRESH_SECS,
            });
        }
        self.refresh_interval = Duration::from_secs(secs);
        Ok(self)
    }

    /// The provider this configuration selects.
    pub fn source(&self) -> Arc<dyn MarketDataSource> {
        if self.offline {
            return Arc::new(SyntheticSource::new());
        }

        let auth = match &self.yahoo_cookie {
            Some(cookie) => HttpAuth::Cookie(cookie.clone()),
            None => HttpAuth::None,
        };
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        Arc::new(
            YahooAdapter::with_http_client(Arc::new(ReqwestHttpClient::new()), auth)
                .with_retry(self.retry.clone())
                .with_timeout_ms(timeout_ms),
        )
    }

    /// Fetcher bounded by `timeout` for the whole call, retries included.
    pub fn fetcher(&self) -> DataFetcher {
        DataFetcher::new(self.source()).with_timeout(self.timeout)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            let parsed = value.trim().parse().ok();
            parsed.ok_or(ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        }),
    }
}
