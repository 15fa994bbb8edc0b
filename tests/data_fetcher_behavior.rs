//! Behavior-driven tests for the data fetcher.
//!
//! These cover what the dashboard relies on from a fetch: rows confined to the
//! requested range, strict date order, partial metadata, the distinction
//! between "unknown symbol" and "provider trouble", and the timeout bound.

mod support;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use support::{aapl_january_2023, apple_info, bar, shared, Script, ScriptedSource};
use tickdash_core::{
    CompanyInfo, DataFetcher, FailureKind, HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse,
    RetryConfig, SourceError, SourceErrorKind, SyntheticSource, TickerRequest, YahooAdapter,
};
use time::macros::date;
use time::Weekday;

fn request(symbol: &str, start: &str, end: &str) -> TickerRequest {
    TickerRequest::parse(symbol, start, end, date!(2024 - 06 - 28)).expect("valid request")
}

// =============================================================================
// Data Fetcher: Range and ordering
// =============================================================================

#[tokio::test]
async fn when_provider_returns_extra_rows_fetcher_keeps_only_the_requested_window() {
    // Given: A provider that ignores the range and returns a wider window
    let mut bars = aapl_january_2023();
    bars.push(bar(date!(2022 - 12 - 30), 128.41, 129.95, 127.43, 129.93, 77_034_200));
    bars.push(bar(date!(2023 - 01 - 11), 131.25, 133.51, 130.46, 133.49, 69_458_900));
    let source = shared(ScriptedSource::new().with("AAPL", Script::Bars(bars)));

    // When: The fetcher asks for 2023-01-01..2023-01-10
    let req = request("AAPL", "2023-01-01", "2023-01-10");
    let outcome = DataFetcher::new(source)
        .fetch(&req)
        .await
        .expect("fetch should succeed");

    // Then: Every row lies within the requested range
    assert_eq!(outcome.series.len(), 6);
    assert!(outcome
        .series
        .iter()
        .all(|row| row.date >= req.start_date() && row.date <= req.end_date()));
}

#[tokio::test]
async fn when_provider_returns_unsorted_duplicates_fetcher_returns_strictly_ascending_dates() {
    // Given: Rows out of order with one date repeated
    let mut bars = aapl_january_2023();
    bars.reverse();
    bars.push(bar(date!(2023 - 01 - 05), 125.0, 126.0, 124.0, 125.5, 1));
    let source = shared(ScriptedSource::new().with("AAPL", Script::Bars(bars)));

    // When: The series is fetched
    let outcome = DataFetcher::new(source)
        .fetch(&request("AAPL", "2023-01-01", "2023-01-10"))
        .await
        .expect("fetch should succeed");

    // Then: Dates are strictly ascending and unique
    let rows = outcome.series.bars();
    assert!(rows.windows(2).all(|pair| pair[0].date < pair[1].date));
    assert_eq!(rows.len(), 6);
}

#[tokio::test]
async fn when_range_is_a_weekend_fetcher_returns_an_empty_series_not_an_error() {
    // Given: The offline source, which never trades on weekends
    let fetcher = DataFetcher::new(Arc::new(SyntheticSource::new()));

    // When: The range covers only Saturday and Sunday
    let outcome = fetcher
        .fetch(&request("AAPL", "2024-06-01", "2024-06-02"))
        .await
        .expect("a closed market is not a failure");

    // Then: The series is empty and metadata is still present
    assert!(outcome.series.is_empty());
    assert_eq!(outcome.info.long_name.as_deref(), Some("Apple Inc."));
}

#[tokio::test]
async fn when_offline_source_serves_a_month_only_weekdays_are_returned() {
    // Given: The offline source
    let fetcher = DataFetcher::new(Arc::new(SyntheticSource::new()));

    // When: A full month is requested
    let outcome = fetcher
        .fetch(&request("NVDA", "2024-05-01", "2024-05-31"))
        .await
        .expect("known symbol");

    // Then: 23 weekday rows, no weekend rows
    assert_eq!(outcome.series.len(), 23);
    assert!(outcome
        .series
        .iter()
        .all(|row| !matches!(row.date.weekday(), Weekday::Saturday | Weekday::Sunday)));
}

// =============================================================================
// Data Fetcher: Metadata
// =============================================================================

#[tokio::test]
async fn when_metadata_is_partial_missing_fields_stay_absent() {
    // Given: Metadata with no P/E ratio or dividend yield
    let source = shared(
        ScriptedSource::new()
            .with("AAPL", Script::Bars(aapl_january_2023()))
            .with_info(apple_info()),
    );

    // When: The fetch completes
    let outcome = DataFetcher::new(source)
        .fetch(&request("AAPL", "2023-01-01", "2023-01-10"))
        .await
        .expect("fetch should succeed");

    // Then: Present fields survive and missing ones are None
    assert_eq!(outcome.info.sector.as_deref(), Some("Technology"));
    assert!(outcome.info.pe_ratio.is_none());
    assert!(outcome.info.dividend_yield.is_none());
    assert!(outcome.warnings.is_empty());
}

// =============================================================================
// Data Fetcher: Error classification
// =============================================================================

#[tokio::test]
async fn when_symbol_is_unknown_fetcher_reports_no_data() {
    // Given: A provider that does not know the symbol
    let source = shared(ScriptedSource::new());

    // When: It is fetched
    let error = DataFetcher::new(source)
        .fetch(&request("ZZZZINVALID", "2024-01-02", "2024-01-31"))
        .await
        .expect_err("unknown symbol");

    // Then: The error is NoData, not a generic fetch failure
    assert_eq!(error.kind(), SourceErrorKind::NoData);
    assert_eq!(error.failure_kind(), FailureKind::NoData);
}

#[tokio::test]
async fn when_provider_is_down_fetcher_reports_fetch_error() {
    // Given: A provider failing with a transient error
    let source = shared(ScriptedSource::new().with(
        "AAPL",
        Script::Fail(SourceError::unavailable("upstream returned 503")),
    ));

    // When: It is fetched
    let error = DataFetcher::new(source)
        .fetch(&request("AAPL", "2024-01-02", "2024-01-31"))
        .await
        .expect_err("provider down");

    // Then: It surfaces as a fetch error
    assert_eq!(error.failure_kind(), FailureKind::Fetch);
    assert!(error.retryable());
}

#[tokio::test(start_paused = true)]
async fn when_provider_hangs_fetcher_gives_up_at_the_timeout() {
    // Given: A provider that never answers and a 10 second budget
    let source = shared(ScriptedSource::new().with("AAPL", Script::Hang));
    let fetcher = DataFetcher::new(source).with_timeout(Duration::from_secs(10));

    // When: The fetch runs
    let started = tokio::time::Instant::now();
    let error = fetcher
        .fetch(&request("AAPL", "2024-01-02", "2024-01-31"))
        .await
        .expect_err("must time out");

    // Then: It fails as a timeout once the budget is spent
    assert_eq!(error.kind(), SourceErrorKind::Timeout);
    assert_eq!(error.failure_kind(), FailureKind::Fetch);
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(started.elapsed() < Duration::from_secs(11));
}

// =============================================================================
// Data Fetcher: Yahoo wire format end to end
// =============================================================================

struct CannedHttp {
    chart: HttpResponse,
    seen: Mutex<Vec<String>>,
}

impl HttpClient for CannedHttp {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let reply = if request.url.contains("/v8/finance/chart/") {
            Ok(self.chart.clone())
        } else {
            Err(HttpError::connect("metadata endpoints offline"))
        };
        self.seen
            .lock()
            .expect("url log should not be poisoned")
            .push(request.url);
        Box::pin(async move { reply })
    }
}

#[tokio::test]
async fn when_yahoo_metadata_is_unreachable_history_still_displays() {
    // Given: A Yahoo adapter whose chart endpoint works but metadata does not
    let chart = r#"{"chart":{"result":[{
        "meta":{"gmtoffset":-18000},
        "timestamp":[1672756200,1672842600],
        "indicators":{"quote":[{
            "open":[130.28,126.89],"high":[130.90,128.66],"low":[124.17,125.08],
            "close":[125.07,126.36],"volume":[112117500,89113600]
        }]}
    }],"error":null}}"#;
    let http = Arc::new(CannedHttp {
        chart: HttpResponse::ok_json(chart),
        seen: Mutex::new(Vec::new()),
    });
    let adapter = YahooAdapter::with_http_client(http.clone(), HttpAuth::None)
        .with_retry(RetryConfig::no_retry());

    // When: The fetcher runs against it
    let outcome = DataFetcher::new(Arc::new(adapter))
        .fetch(&request("AAPL", "2023-01-01", "2023-01-10"))
        .await
        .expect("history alone decides success");

    // Then: Rows are present, metadata is empty, and a warning explains why
    assert_eq!(outcome.series.len(), 2);
    assert_eq!(outcome.series.last().map(|row| row.close), Some(126.36));
    assert_eq!(outcome.info, CompanyInfo::default());
    assert_eq!(outcome.warnings.len(), 1);
    let seen = http.seen.lock().expect("url log should not be poisoned");
    assert!(seen.iter().any(|url| url.contains("interval=1d")));
}
