//! Test doubles shared by the behavior suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tickdash_core::{
    CompanyInfo, MarketDataSource, PriceBar, PriceSeries, SourceError, SourceFuture, Symbol,
    TickerRequest,
};
use time::macros::date;
use time::Date;

/// How a [`ScriptedSource`] answers for one symbol.
#[derive(Clone)]
pub enum Script {
    Bars(Vec<PriceBar>),
    Fail(SourceError),
    /// Never answers within any sane timeout.
    Hang,
}

/// In-memory provider that counts calls and can be told to fail or stall.
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    info: CompanyInfo,
    history_calls: AtomicUsize,
    info_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delays: HashMap::new(),
            info: CompanyInfo::default(),
            history_calls: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, symbol: &str, script: Script) -> Self {
        self.scripts.insert(symbol.to_owned(), script);
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_owned(), delay);
        self
    }

    pub fn with_info(mut self, info: CompanyInfo) -> Self {
        self.info = info;
        self
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

impl MarketDataSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn history<'a>(&'a self, req: &'a TickerRequest) -> SourceFuture<'a, PriceSeries> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(delay) = self.delays.get(req.symbol().as_str()) {
                tokio::time::sleep(*delay).await;
            }
            match self.scripts.get(req.symbol().as_str()) {
                Some(Script::Bars(bars)) => Ok(PriceSeries::from_bars(bars.clone())),
                Some(Script::Fail(error)) => Err(error.clone()),
                Some(Script::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(SourceError::internal("unreachable"))
                }
                None => Err(SourceError::no_data(format!(
                    "no data found for symbol {}",
                    req.symbol()
                ))),
            }
        })
    }

    fn company_info<'a>(&'a self, _symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(self.info.clone()) })
    }
}

pub fn shared(source: ScriptedSource) -> Arc<ScriptedSource> {
    Arc::new(source)
}

pub fn bar(date: Date, open: f64, high: f64, low: f64, close: f64, volume: u64) -> PriceBar {
    PriceBar::new(date, open, high, low, close, volume).expect("valid bar")
}

/// AAPL daily bars for the first trading days of January 2023.
pub fn aapl_january_2023() -> Vec<PriceBar> {
    vec![
        bar(date!(2023 - 01 - 03), 130.28, 130.90, 124.17, 125.07, 112_117_500),
        bar(date!(2023 - 01 - 04), 126.89, 128.66, 125.08, 126.36, 89_113_600),
        bar(date!(2023 - 01 - 05), 127.13, 127.77, 124.76, 125.02, 80_962_700),
        bar(date!(2023 - 01 - 06), 126.01, 130.29, 124.89, 129.62, 87_754_700),
        bar(date!(2023 - 01 - 09), 130.47, 133.41, 129.89, 130.15, 70_790_800),
        bar(date!(2023 - 01 - 10), 130.26, 131.26, 128.12, 130.73, 63_896_200),
    ]
}

pub fn apple_info() -> CompanyInfo {
    CompanyInfo {
        long_name: Some(String::from("Apple Inc.")),
        sector: Some(String::from("Technology")),
        industry: Some(String::from("Consumer Electronics")),
        market_cap: Some(2_000_000_000_000.0),
        pe_ratio: None,
        dividend_yield: None,
        currency: Some(String::from("USD")),
    }
}

pub fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}
