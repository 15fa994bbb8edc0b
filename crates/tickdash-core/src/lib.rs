//! # Tickdash Core
//!
//! Everything behind the tickdash stock dashboard except the surfaces that
//! draw it.
//!
//! ## Overview
//!
//! - **Domain types** for symbols, date ranges, daily bars and company metadata
//! - **Provider adapters** for Yahoo Finance and an offline synthetic source
//! - **Data fetcher** with a bounded timeout and bounded retry
//! - **Metrics** (latest close/volume, period and 52-week extremes, MA, RSI)
//! - **Chart descriptions** for candlestick, line, area, volume and live tape
//! - **Dashboard controller**, a small state machine where the latest request wins
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance and synthetic providers |
//! | [`alerts`] | Above/below price alerts |
//! | [`chart`] | Chart renderer and serializable chart specs |
//! | [`config`] | Defaults, environment overrides, provider selection |
//! | [`controller`] | `AwaitingInput → Loading → Displaying/Failed` |
//! | [`data_source`] | Provider trait and structured errors |
//! | [`domain`] | Symbol, TickerRequest, PriceSeries, CompanyInfo, ChartStyle |
//! | [`error`] | Input validation errors |
//! | [`fetcher`] | History + metadata fetch |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`metrics`] | Metrics and indicators |
//! | [`retry`] | Backoff policies |
//! | [`view`] | Presentation models and number formatting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickdash_core::{DashboardController, DashboardInputs, DataFetcher, Period, SyntheticSource, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = DataFetcher::new(Arc::new(SyntheticSource::new()));
//!     let mut controller = DashboardController::new(fetcher);
//!
//!     let inputs = DashboardInputs::new(Symbol::parse("AAPL")?).with_range(Period::ThreeMonths);
//!     if let Some(view) = controller.submit(inputs).await?.view() {
//!         println!("{}: {}", view.header, view.tiles[0].value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ tickdash / web page  │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ DashboardController  │────▶│ Metrics / Charts │
//! └──────────┬───────────┘     └──────────────────┘
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ DataFetcher          │────▶│ MarketDataSource │
//! │ (timeout)            │     │ (Yahoo/offline)  │
//! └──────────────────────┘     └────────┬─────────┘
//!                                       ▼
//!                              ┌──────────────────┐
//!                              │ HttpClient       │
//!                              │ (reqwest+retry)  │
//!                              └──────────────────┘
//! ```

pub mod adapters;
pub mod alerts;
pub mod chart;
pub mod config;
pub mod controller;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod metrics;
pub mod retry;
pub mod view;

// Adapter implementations
pub use adapters::{SyntheticSource, YahooAdapter};

pub use alerts::{AlertDirection, PriceAlert, TriggeredAlert};

// Charts
pub use chart::{Candle, ChartRenderer, ChartSpec, Direction, Fill, Point, Theme, Trace};

pub use config::{ConfigError, DashboardConfig};

// Controller
pub use controller::{
    Clock, Completion, DashboardController, DashboardInputs, DashboardState, FixedClock, LiveTape,
    Pending, StateKind, SystemClock, Ticket,
};

// Data source trait and types
pub use data_source::{FailureKind, MarketDataSource, SourceError, SourceErrorKind, SourceFuture};

// Domain models
pub use domain::{
    format_date, parse_date, ChartStyle, CompanyInfo, DateRange, Period, PriceBar, PriceSeries,
    RangeSelection, Symbol, TickerRequest, MAX_LOOKBACK_DAYS, PRESET_SYMBOLS,
};

pub use error::ValidationError;

pub use fetcher::{DataFetcher, FetchOutcome};

// HTTP client types
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use metrics::{Indicators, Metrics, MetricsComputer, PriceChange, RsiSignal, TrendSignal};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Views
pub use view::{CompanyPanel, DashboardView, FailureView, Footer, MetricTile, RecentRow, ViewId};
