use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::data_source::{MarketDataSource, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::{CompanyInfo, PriceBar, PriceSeries, Symbol, TickerRequest};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";
const SUMMARY_MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics";
const CRUMB_TTL: StdDuration = StdDuration::from_secs(3600);

// ============================================================================
// Crumb handling
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Caches the crumb token Yahoo requires on quoteSummary calls.
///
/// The session cookie that goes with it lives in the transport's cookie jar.
/// Holding the async mutex across the refresh keeps concurrent callers from
/// racing each other to fetch a new crumb.
#[derive(Debug, Default)]
struct CrumbManager {
    crumb: Mutex<Option<Crumb>>,
}

impl CrumbManager {
    async fn get(
        &self,
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            if crumb.fetched_at.elapsed() < CRUMB_TTL {
                return Ok(crumb.value.clone());
            }
        }

        let value = Self::refresh(http_client, timeout_ms).await?;
        *guard = Some(Crumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }

    async fn refresh(
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        // Visiting fc.yahoo.com seeds the cookie jar; its status is irrelevant.
        let cookie_request = HttpRequest::get(COOKIE_URL)
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);
        http_client
            .execute(cookie_request)
            .await
            .map_err(|e| transport_error("failed to fetch Yahoo cookie", &e))?;

        for endpoint in CRUMB_URLS {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_timeout_ms(timeout_ms);

            let Ok(response) = http_client.execute(request).await else {
                continue;
            };
            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            let body = response.body.trim();
            let looks_valid = response.is_success()
                && !body.is_empty()
                && body.len() < 100
                && !body.contains(' ')
                && !body.contains('<');
            if looks_valid {
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch Yahoo crumb from all endpoints",
        ))
    }
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Yahoo Finance adapter for daily history and company metadata.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    retry: RetryConfig,
    timeout_ms: u64,
    crumbs: Arc<CrumbManager>,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), HttpAuth::None)
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, auth: HttpAuth) -> Self {
        Self {
            http_client,
            auth,
            retry: RetryConfig::default(),
            timeout_ms: crate::http_client::DEFAULT_TIMEOUT_MS,
            crumbs: Arc::new(CrumbManager::default()),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn request(&self, url: impl Into<String>) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms)
    }

    async fn send(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let response = self
            .http_client
            .execute(self.request(url))
            .await
            .map_err(|e| transport_error("yahoo transport error", &e))?;

        if response.status == 429 {
            return Err(SourceError::rate_limited("yahoo returned status 429"));
        }
        if self.retry.should_retry_status(response.status) {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }
        Ok(response)
    }

    async fn fetch_history(&self, req: &TickerRequest) -> Result<PriceSeries, SourceError> {
        let period1 = unix_midnight(req.start_date());
        // period2 is exclusive
        let period2 = unix_midnight(req.end_date()) + Duration::days(1).whole_seconds();
        let url = format!(
            "{CHART_URL}/{}?period1={period1}&period2={period2}&interval=1d&events=history",
            urlencoding::encode(req.symbol().as_str()),
        );

        debug!(symbol = %req.symbol(), %url, "requesting yahoo chart");
        let response = self.retry.run("yahoo.chart", || self.send(&url)).await?;
        parse_chart_response(req.symbol(), &response)
    }

    async fn fetch_company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let response = self.summary_call(symbol).await?;

        // Stale crumb: refresh once and try again.
        let response = if response.status == 401 || response.status == 403 {
            self.crumbs.invalidate().await;
            self.summary_call(symbol).await?
        } else {
            response
        };

        parse_summary_response(symbol, &response)
    }

    async fn summary_call(&self, symbol: &Symbol) -> Result<HttpResponse, SourceError> {
        let crumb = self.crumbs.get(&self.http_client, self.timeout_ms).await?;
        let url = format!(
            "{SUMMARY_URL}/{}?modules={SUMMARY_MODULES}&crumb={}",
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&crumb),
        );
        self.retry.run("yahoo.quote_summary", || self.send(&url)).await
    }
}

impl MarketDataSource for YahooAdapter {
    fn name(&self) -> &'static str {
        "Yahoo Finance"
    }

    fn history<'a>(&'a self, req: &'a TickerRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(self.fetch_history(req))
    }

    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
        Box::pin(self.fetch_company_info(symbol))
    }
}

fn transport_error(context: &str, error: &HttpError) -> SourceError {
    let message = format!("{context}: {}", error.message());
    if error.is_timeout() {
        SourceError::timeout(message)
    } else {
        SourceError::unavailable(message)
    }
}

fn unix_midnight(date: time::Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

// ============================================================================
// Response parsing
// ============================================================================

fn parse_chart_response(symbol: &Symbol, response: &HttpResponse) -> Result<PriceSeries, SourceError> {
    let parsed: ChartEnvelope = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(_) if response.status == 404 => {
            return Err(SourceError::no_data(format!("no data found for symbol {symbol}")));
        }
        Err(_) if !response.is_success() => {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }
        Err(e) => {
            return Err(SourceError::internal(format!("failed to parse yahoo chart: {e}")));
        }
    };

    if let Some(error) = parsed.chart.error {
        return Err(api_error(symbol, &error, response.status));
    }
    if !response.is_success() {
        return Err(SourceError::unavailable(format!(
            "yahoo returned status {}",
            response.status
        )));
    }

    let Some(result) = parsed.chart.result.and_then(|mut results| {
        if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        }
    }) else {
        return Err(SourceError::no_data(format!("no data found for symbol {symbol}")));
    };

    let offset = result.meta.as_ref().and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(PriceSeries::empty());
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let fields = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = fields else {
            continue;
        };

        // Daily bars are stamped at the exchange open; shift into exchange
        // local time before taking the calendar date.
        let Some(Ok(local)) = ts.checked_add(offset).map(OffsetDateTime::from_unix_timestamp) else {
            debug!(%symbol, ts, "skipping row with out-of-range timestamp");
            continue;
        };
        let volume = value_at(&quote.volume, i).map(|v| v.max(0) as u64).unwrap_or(0);

        match PriceBar::new(local.date(), open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => debug!(%symbol, ts, %error, "skipping invalid yahoo row"),
        }
    }

    Ok(PriceSeries::from_bars(bars))
}

fn parse_summary_response(symbol: &Symbol, response: &HttpResponse) -> Result<CompanyInfo, SourceError> {
    let parsed: SummaryEnvelope = serde_json::from_str(&response.body).map_err(|e| {
        if response.is_success() {
            SourceError::internal(format!("failed to parse yahoo quoteSummary: {e}"))
        } else {
            SourceError::unavailable(format!("yahoo returned status {}", response.status))
        }
    })?;

    if let Some(error) = parsed.quote_summary.error {
        return Err(api_error(symbol, &error, response.status));
    }

    let Some(result) = parsed.quote_summary.result.into_iter().flatten().next() else {
        warn!(%symbol, "yahoo quoteSummary returned no result");
        return Ok(CompanyInfo::default());
    };

    let profile = result.asset_profile.unwrap_or_default();
    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    Ok(CompanyInfo {
        long_name: price.long_name.or(price.short_name).filter(|name| !name.is_empty()),
        sector: profile.sector.filter(|s| !s.is_empty()),
        industry: profile.industry.filter(|s| !s.is_empty()),
        market_cap: raw(&price.market_cap).or_else(|| raw(&detail.market_cap)),
        pe_ratio: raw(&detail.trailing_pe).or_else(|| raw(&detail.forward_pe)),
        dividend_yield: raw(&detail.dividend_yield)
            .or_else(|| raw(&stats.dividend_yield)),
        currency: price.currency.filter(|c| !c.is_empty()),
    })
}

fn api_error(symbol: &Symbol, error: &YahooError, status: u16) -> SourceError {
    let description = error.description.as_deref().unwrap_or("unknown error");
    let code = error.code.as_deref().unwrap_or_default();
    // Yahoo answers a real symbol with no rows in range (before listing, say)
    // with 400 "Data doesn't exist for startDate = ...".
    let no_rows = description.to_ascii_lowercase().contains("data doesn't exist");
    if code.eq_ignore_ascii_case("Not Found") || status == 404 || no_rows {
        SourceError::no_data(format!("no data found for symbol {symbol}: {description}"))
    } else if code.eq_ignore_ascii_case("Bad Request") {
        SourceError::invalid_request(format!("yahoo rejected request: {description}"))
    } else {
        SourceError::unavailable(format!("yahoo API error {code}: {description}"))
    }
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value
        .as_ref()
        .and_then(|v| v.raw)
        .filter(|v| v.is_finite())
}

// Yahoo chart API structures
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

// Yahoo quoteSummary structures
#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE", default)]
    forward_pe: Option<RawValue>,
    #[serde(default)]
    dividend_yield: Option<RawValue>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    dividend_yield: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; an empty object means absent.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}
