//! Provider adapter contract and its structured error.
//!
//! | Method | Request | Response |
//! |--------|---------|----------|
//! | [`history`](MarketDataSource::history) | [`TickerRequest`] | [`PriceSeries`] |
//! | [`company_info`](MarketDataSource::company_info) | [`Symbol`] | [`CompanyInfo`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CompanyInfo, PriceSeries, Symbol, TickerRequest, ValidationError};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    Timeout,
    RateLimited,
    NoData,
    InvalidRequest,
    Internal,
}

/// User-facing failure category shown by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient network or provider failure.
    Fetch,
    /// Unknown or delisted symbol.
    NoData,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch_error",
            Self::NoData => "no_data",
        }
    }
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }

    /// Collapse the provider taxonomy into what the dashboard shows.
    pub const fn failure_kind(&self) -> FailureKind {
        match self.kind {
            SourceErrorKind::NoData => FailureKind::NoData,
            _ => FailureKind::Fetch,
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Boxed future returned by [`MarketDataSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Market data provider contract.
///
/// Implementations must be `Send + Sync`; the web server shares one source
/// across requests.
pub trait MarketDataSource: Send + Sync {
    /// Short provider name shown in the dashboard footer.
    fn name(&self) -> &'static str;

    /// Daily OHLCV rows for the request's symbol and range.
    ///
    /// # Errors
    ///
    /// - [`SourceErrorKind::NoData`] when the provider does not know the symbol
    /// - [`SourceErrorKind::Unavailable`], [`SourceErrorKind::Timeout`] or
    ///   [`SourceErrorKind::RateLimited`] for transient failures
    fn history<'a>(&'a self, req: &'a TickerRequest) -> SourceFuture<'a, PriceSeries>;

    /// Company metadata; missing fields are `None` rather than errors.
    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo>;
}
