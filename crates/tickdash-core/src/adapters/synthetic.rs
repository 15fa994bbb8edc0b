use time::{Date, Duration, Weekday};

use crate::data_source::{MarketDataSource, SourceError, SourceFuture};
use crate::{CompanyInfo, PriceBar, PriceSeries, Symbol, TickerRequest};

struct CatalogEntry {
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    industry: &'static str,
    base_price: f64,
    market_cap: f64,
    pe_ratio: Option<f64>,
    dividend_yield: Option<f64>,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        symbol: "AAPL",
        name: "Apple Inc.",
        sector: "Technology",
        industry: "Consumer Electronics",
        base_price: 185.0,
        market_cap: 2.9e12,
        pe_ratio: Some(30.1),
        dividend_yield: Some(0.0051),
    },
    CatalogEntry {
        symbol: "GOOGL",
        name: "Alphabet Inc.",
        sector: "Communication Services",
        industry: "Internet Content & Information",
        base_price: 140.0,
        market_cap: 1.8e12,
        pe_ratio: Some(24.6),
        dividend_yield: None,
    },
    CatalogEntry {
        symbol: "MSFT",
        name: "Microsoft Corporation",
        sector: "Technology",
        industry: "Software - Infrastructure",
        base_price: 380.0,
        market_cap: 2.8e12,
        pe_ratio: Some(35.4),
        dividend_yield: Some(0.0074),
    },
    CatalogEntry {
        symbol: "TSLA",
        name: "Tesla, Inc.",
        sector: "Consumer Cyclical",
        industry: "Auto Manufacturers",
        base_price: 240.0,
        market_cap: 7.6e11,
        pe_ratio: Some(68.2),
        dividend_yield: None,
    },
    CatalogEntry {
        symbol: "AMZN",
        name: "Amazon.com, Inc.",
        sector: "Consumer Cyclical",
        industry: "Internet Retail",
        base_price: 150.0,
        market_cap: 1.6e12,
        pe_ratio: Some(52.8),
        dividend_yield: None,
    },
    CatalogEntry {
        symbol: "NVDA",
        name: "NVIDIA Corporation",
        sector: "Technology",
        industry: "Semiconductors",
        base_price: 480.0,
        market_cap: 1.2e12,
        pe_ratio: Some(64.9),
        dividend_yield: Some(0.0003),
    },
    CatalogEntry {
        symbol: "META",
        name: "Meta Platforms, Inc.",
        sector: "Communication Services",
        industry: "Internet Content & Information",
        base_price: 350.0,
        market_cap: 9.0e11,
        pe_ratio: Some(29.7),
        dividend_yield: None,
    },
    CatalogEntry {
        symbol: "NFLX",
        name: "Netflix, Inc.",
        sector: "Communication Services",
        industry: "Entertainment",
        base_price: 490.0,
        market_cap: 2.1e11,
        pe_ratio: Some(47.3),
        dividend_yield: None,
    },
    CatalogEntry {
        symbol: "SPY",
        name: "SPDR S&P 500 ETF Trust",
        sector: "",
        industry: "",
        base_price: 470.0,
        market_cap: 4.3e11,
        pe_ratio: None,
        dividend_yield: Some(0.0137),
    },
];

/// Deterministic offline source.
///
/// Known symbols get a smooth pseudo-random walk over weekdays; the value for
/// a given date does not depend on the requested range, so overlapping
/// requests agree. Anything outside the catalog is reported as `NoData`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }

    /// Symbols this source can answer for.
    pub fn known_symbols() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|entry| entry.symbol)
    }

    fn entry(symbol: &Symbol) -> Result<&'static CatalogEntry, SourceError> {
        CATALOG
            .iter()
            .find(|entry| entry.symbol == symbol.as_str())
            .ok_or_else(|| SourceError::no_data(format!("no data found for symbol {symbol}")))
    }

    fn generate(req: &TickerRequest) -> Result<PriceSeries, SourceError> {
        let entry = Self::entry(req.symbol())?;
        let seed = symbol_seed(req.symbol());
        let mut bars = Vec::new();
        let mut day = req.start_date();

        while day <= req.end_date() {
            if is_trading_day(day) {
                let close = close_on(entry, seed, day);
                let open = close_on(entry, seed, previous_trading_day(day));
                let mut rng = fastrand::Rng::with_seed(seed ^ day_number(day) as u64);
                let high = open.max(close) * (1.0 + rng.f64() * 0.012);
                let low = open.min(close) * (1.0 - rng.f64() * 0.012);
                let volume = (20_000_000.0 * (0.6 + rng.f64() * 0.8)) as u64;

                bars.push(PriceBar::new(
                    day,
                    round_cents(open),
                    round_cents(high),
                    round_cents(low),
                    round_cents(close),
                    volume,
                )?);
            }
            day = match day.next_day() {
                Some(next) => next,
                None => break,
            };
        }

        Ok(PriceSeries::from_bars(bars))
    }

    fn info(symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let entry = Self::entry(symbol)?;
        Ok(CompanyInfo {
            long_name: Some(entry.name.to_owned()),
            sector: Some(entry.sector.to_owned()).filter(|s| !s.is_empty()),
            industry: Some(entry.industry.to_owned()).filter(|s| !s.is_empty()),
            market_cap: Some(entry.market_cap),
            pe_ratio: entry.pe_ratio,
            dividend_yield: entry.dividend_yield,
            currency: Some(String::from("USD")),
        })
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "Synthetic (offline)"
    }

    fn history<'a>(&'a self, req: &'a TickerRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move { Self::generate(req) })
    }

    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
        Box::pin(async move { Self::info(symbol) })
    }
}

fn is_trading_day(day: Date) -> bool {
    !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday)
}

fn previous_trading_day(day: Date) -> Date {
    let mut prev = day - Duration::days(1);
    while !is_trading_day(prev) {
        prev -= Duration::days(1);
    }
    prev
}

fn day_number(day: Date) -> i32 {
    day.to_julian_day()
}

fn close_on(entry: &CatalogEntry, seed: u64, day: Date) -> f64 {
    let t = f64::from(day_number(day));
    let phase = (seed % 628) as f64 / 100.0;
    let trend = (t / 45.0 + phase).sin() * 0.12 + (t / 11.0 + phase * 0.5).sin() * 0.04;
    let mut rng = fastrand::Rng::with_seed(seed.wrapping_mul(31) ^ day_number(day) as u64);
    let noise = (rng.f64() - 0.5) * 0.02;
    entry.base_price * (1.0 + trend + noise)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use time::macros::date;

    fn request(symbol: &str, start: &str, end: &str) -> TickerRequest {
        TickerRequest::parse(symbol, start, end, date!(2024 - 06 - 28)).expect("valid request")
    }

    #[tokio::test]
    async fn emits_weekdays_only_in_ascending_order() {
        let series = SyntheticSource::new()
            .history(&request("AAPL", "2024-01-01", "2024-01-14"))
            .await
            .expect("known symbol");

        assert_eq!(series.len(), 10);
        assert!(series.iter().all(|bar| is_trading_day(bar.date)));
        assert!(series.bars().windows(2).all(|w| w[0].date < w[1].date));
        assert!(series.iter().all(|bar| bar.low <= bar.high));
    }

    #[tokio::test]
    async fn overlapping_ranges_agree_on_shared_dates() {
        let source = SyntheticSource::new();
        let wide = source
            .history(&request("MSFT", "2024-02-01", "2024-03-29"))
            .await
            .expect("known symbol");
        let narrow = source
            .history(&request("MSFT", "2024-03-01", "2024-03-08"))
            .await
            .expect("known symbol");

        for bar in narrow.iter() {
            let twin = wide.iter().find(|b| b.date == bar.date).expect("shared date");
            assert_eq!(twin, bar);
        }
    }

    #[tokio::test]
    async fn unknown_symbol_is_no_data() {
        let err = SyntheticSource::new()
            .history(&request("ZZZZINVALID", "2024-01-01", "2024-01-10"))
            .await
            .expect_err("unknown symbol");
        assert_eq!(err.kind(), SourceErrorKind::NoData);
    }

    #[tokio::test]
    async fn etf_has_no_sector() {
        let symbol = Symbol::parse("SPY").expect("valid symbol");
        let info = SyntheticSource::new()
            .company_info(&symbol)
            .await
            .expect("known symbol");
        assert!(info.sector.is_none());
        assert!(info.pe_ratio.is_none());
        assert_eq!(info.long_name.as_deref(), Some("SPDR S&P 500 ETF Trust"));
    }
}
