//! History + metadata fetch with a bounded per-call timeout.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::data_source::{MarketDataSource, SourceError};
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::{CompanyInfo, PriceSeries, Symbol, TickerRequest};

/// Everything one fetch produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub request: TickerRequest,
    pub series: PriceSeries,
    pub info: CompanyInfo,
    /// Non-fatal problems, e.g. company metadata that could not be loaded.
    pub warnings: Vec<String>,
}

/// Fetches a price series and company metadata from one provider.
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn MarketDataSource>,
    timeout: Duration,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Fetch history and metadata concurrently.
    ///
    /// Only the history decides success. A metadata failure downgrades to an
    /// empty [`CompanyInfo`] plus a warning.
    pub async fn fetch(&self, req: &TickerRequest) -> Result<FetchOutcome, SourceError> {
        let (series, info) = tokio::join!(self.history(req), self.company_info(req.symbol()));
        let series = series?;

        let mut warnings = Vec::new();
        let info = match info {
            Ok(info) => info,
            Err(error) => {
                warn!(symbol = %req.symbol(), %error, "company info unavailable");
                warnings.push(format!("company info unavailable: {}", error.message()));
                CompanyInfo::default()
            }
        };

        Ok(FetchOutcome {
            request: req.clone(),
            series,
            info,
            warnings,
        })
    }

    /// Daily rows inside the request range, date-ascending and unique per date.
    pub async fn history(&self, req: &TickerRequest) -> Result<PriceSeries, SourceError> {
        let series = self
            .bounded(self.source.history(req), "history", req.symbol())
            .await?;

        let received = series.len();
        // re-normalize: adapters are not trusted to order or clip
        let series = PriceSeries::from_bars(series.into()).clipped_to(req.range());
        if series.len() != received {
            debug!(
                symbol = %req.symbol(),
                received,
                kept = series.len(),
                "dropped rows outside requested range"
            );
        }

        debug!(
            symbol = %req.symbol(),
            range = %req.range(),
            rows = series.len(),
            source = self.source.name(),
            "history fetched"
        );
        Ok(series)
    }

    pub async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        self.bounded(self.source.company_info(symbol), "company info", symbol)
            .await
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, SourceError>>,
        what: &str,
        symbol: &Symbol,
    ) -> Result<T, SourceError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(format!(
                "{what} request for {symbol} timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{FailureKind, SourceErrorKind, SourceFuture};
    use crate::PriceBar;
    use time::macros::date;

    struct FixedSource {
        bars: Vec<PriceBar>,
        info: Result<CompanyInfo, SourceError>,
        delay: Duration,
    }

    impl MarketDataSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn history<'a>(&'a self, _req: &'a TickerRequest) -> SourceFuture<'a, PriceSeries> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok(PriceSeries::from_bars(self.bars.clone()))
            })
        }

        fn company_info<'a>(&'a self, _symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
            Box::pin(async move { self.info.clone() })
        }
    }

    fn bar(date: time::Date, close: f64) -> PriceBar {
        PriceBar::new(date, close, close, close, close, 10).expect("valid bar")
    }

    fn request() -> TickerRequest {
        TickerRequest::parse("AAPL", "2023-01-03", "2023-01-05", date!(2023 - 06 - 01))
            .expect("valid request")
    }

    #[tokio::test]
    async fn rows_outside_range_are_dropped() {
        let source = FixedSource {
            bars: vec![
                bar(date!(2023 - 01 - 02), 1.0),
                bar(date!(2023 - 01 - 04), 2.0),
                bar(date!(2023 - 01 - 03), 3.0),
                bar(date!(2023 - 01 - 06), 4.0),
            ],
            info: Ok(CompanyInfo::default()),
            delay: Duration::ZERO,
        };

        let outcome = DataFetcher::new(Arc::new(source))
            .fetch(&request())
            .await
            .expect("fetch should succeed");

        let dates = outcome.series.iter().map(|bar| bar.date).collect::<Vec<_>>();
        assert_eq!(dates, vec![date!(2023 - 01 - 03), date!(2023 - 01 - 04)]);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn metadata_failure_is_a_warning_not_an_error() {
        let source = FixedSource {
            bars: vec![bar(date!(2023 - 01 - 04), 2.0)],
            info: Err(SourceError::unavailable("quoteSummary down")),
            delay: Duration::ZERO,
        };

        let outcome = DataFetcher::new(Arc::new(source))
            .fetch(&request())
            .await
            .expect("history alone decides success");

        assert_eq!(outcome.info, CompanyInfo::default());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("quoteSummary down"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_history_times_out_as_fetch_error() {
        let source = FixedSource {
            bars: Vec::new(),
            info: Ok(CompanyInfo::default()),
            delay: Duration::from_secs(60),
        };

        let err = DataFetcher::new(Arc::new(source))
            .with_timeout(Duration::from_secs(10))
            .fetch(&request())
            .await
            .expect_err("must time out");

        assert_eq!(err.kind(), SourceErrorKind::Timeout);
        assert_eq!(err.failure_kind(), FailureKind::Fetch);
    }
}
