//! Presentation models: everything a front end needs to draw one dashboard.
//!
//! Views are plain serializable data. All number formatting happens here so
//! the terminal and browser surfaces show identical text.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::offset;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset, Weekday};
use uuid::Uuid;

use crate::alerts::TriggeredAlert;
use crate::chart::{ChartRenderer, ChartSpec};
use crate::controller::DashboardInputs;
use crate::data_source::{FailureKind, SourceError};
use crate::fetcher::FetchOutcome;
use crate::metrics::{Indicators, Metrics, MetricsComputer};
use crate::{format_date, ChartStyle, CompanyInfo, DateRange, PriceBar, Symbol};

pub const NOT_AVAILABLE: &str = "N/A";
pub const RECENT_ROWS: usize = 10;
/// Live tape charts need at least this many points to draw a line.
pub const MIN_LIVE_POINTS: usize = 2;

/// Identifier attached to every rendered view (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One labelled figure, optionally with a delta line beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTile {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl MetricTile {
    fn new(label: &str, value: String, delta: Option<String>) -> Self {
        Self {
            label: label.to_owned(),
            value,
            delta,
        }
    }
}

/// A row of the recent-data table, prices rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<&PriceBar> for RecentRow {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: format_date(bar.date),
            open: round2(bar.open),
            high: round2(bar.high),
            low: round2(bar.low),
            close: round2(bar.close),
            volume: bar.volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPanel {
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: String,
    pub pe_ratio: String,
    pub dividend_yield: String,
}

impl From<&CompanyInfo> for CompanyPanel {
    fn from(info: &CompanyInfo) -> Self {
        Self {
            name: text_or_na(info.long_name.as_deref()),
            sector: text_or_na(info.sector.as_deref()),
            industry: text_or_na(info.industry.as_deref()),
            market_cap: info
                .market_cap
                .map(|cap| format!("${}", group_thousands(cap.round() as u64)))
                .unwrap_or_else(na),
            pe_ratio: info.pe_ratio.map(|pe| format!("{pe:.2}")).unwrap_or_else(na),
            dividend_yield: info
                .dividend_yield
                .map(|dy| format!("{:.2}%", dy * 100.0))
                .unwrap_or_else(na),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub source: String,
    pub updated_at: String,
    pub auto_refresh: bool,
    /// US equity regular session (09:30-16:00 New York, weekdays).
    pub market_open: bool,
}

/// A successful dashboard render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub view_id: ViewId,
    pub symbol: Symbol,
    pub header: String,
    pub range: DateRange,
    pub style: ChartStyle,
    pub metrics: Metrics,
    pub indicators: Indicators,
    /// Price, volume, 52W high, 52W low.
    pub tiles: Vec<MetricTile>,
    pub indicator_tiles: Vec<MetricTile>,
    pub price_chart: ChartSpec,
    pub volume_chart: ChartSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_chart: Option<ChartSpec>,
    pub recent_rows: Vec<RecentRow>,
    pub company: CompanyPanel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<TriggeredAlert>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub footer: Footer,
}

/// Inputs for [`DashboardView::build`].
pub struct ViewContext<'a> {
    pub outcome: &'a FetchOutcome,
    pub inputs: &'a DashboardInputs,
    pub renderer: &'a ChartRenderer,
    pub tape: &'a [(OffsetDateTime, f64)],
    pub source: &'a str,
    pub now: OffsetDateTime,
    pub auto_refresh: bool,
}

impl DashboardView {
    pub fn build(ctx: ViewContext<'_>) -> Self {
        let series = &ctx.outcome.series;
        let symbol = ctx.outcome.request.symbol();
        let metrics = MetricsComputer::compute(series);
        let indicators = MetricsComputer::indicators(series);

        let alert = metrics
            .latest_close
            .and_then(|price| ctx.inputs.alert.evaluate(symbol.as_str(), price));

        let live_chart = (ctx.tape.len() >= MIN_LIVE_POINTS)
            .then(|| ctx.renderer.render_live(symbol, ctx.tape));

        Self {
            view_id: ViewId::new_v4(),
            symbol: symbol.clone(),
            header: format!("{symbol} Stock Chart - {}", ctx.inputs.range.label()),
            range: ctx.outcome.request.range(),
            style: ctx.inputs.style,
            metrics,
            indicators,
            tiles: headline_tiles(&metrics, &indicators),
            indicator_tiles: indicator_tiles(&indicators),
            price_chart: ctx.renderer.render_price(symbol, series, ctx.inputs.style),
            volume_chart: ctx.renderer.render_volume(symbol, series),
            live_chart,
            recent_rows: series.tail(RECENT_ROWS).iter().map(RecentRow::from).collect(),
            company: CompanyPanel::from(&ctx.outcome.info),
            alert,
            warnings: ctx.outcome.warnings.clone(),
            footer: Footer {
                source: ctx.source.to_owned(),
                updated_at: format_timestamp(ctx.now),
                auto_refresh: ctx.auto_refresh,
                market_open: is_market_open(ctx.now),
            },
        }
    }
}

/// What the user sees when a fetch fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureView {
    pub symbol: Symbol,
    pub kind: FailureKind,
    pub message: String,
    /// Stable provider error code, e.g. `source.timeout`.
    pub code: String,
}

impl FailureView {
    pub fn from_error(symbol: &Symbol, error: &SourceError) -> Self {
        let kind = error.failure_kind();
        let message = match kind {
            FailureKind::NoData => format!("No data found for symbol: {symbol}"),
            FailureKind::Fetch => format!("Error loading data for {symbol}: {}", error.message()),
        };
        Self {
            symbol: symbol.clone(),
            kind,
            message,
            code: error.code().to_owned(),
        }
    }
}

fn headline_tiles(metrics: &Metrics, indicators: &Indicators) -> Vec<MetricTile> {
    let price_delta = indicators
        .change
        .map(|c| format!("{:+.2} ({:+.2}%)", c.change, c.change_pct));
    let volume_delta = indicators
        .volume_ratio
        .filter(|ratio| (ratio - 1.0).abs() > f64::EPSILON)
        .map(|ratio| format!("{ratio:.1}x avg"));

    vec![
        MetricTile::new("Current Price", money_or_na(metrics.latest_close), price_delta),
        MetricTile::new(
            "Volume",
            metrics
                .latest_volume
                .map(group_thousands)
                .unwrap_or_else(na),
            volume_delta,
        ),
        MetricTile::new("52W High", money_or_na(indicators.high_52w), None),
        MetricTile::new("52W Low", money_or_na(indicators.low_52w), None),
    ]
}

fn indicator_tiles(indicators: &Indicators) -> Vec<MetricTile> {
    vec![
        MetricTile::new(
            "MA(20)",
            money_or_na(indicators.ma_20),
            indicators.ma_20_signal.map(|s| s.label().to_owned()),
        ),
        MetricTile::new("MA(50)", money_or_na(indicators.ma_50), None),
        MetricTile::new(
            "RSI(14)",
            indicators
                .rsi_14
                .map(|rsi| format!("{rsi:.1}"))
                .unwrap_or_else(na),
            indicators.rsi_signal.map(|s| s.label().to_owned()),
        ),
    ]
}

/// `$1,234.56`
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// `1234567` → `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

const NEW_YORK_STANDARD: UtcOffset = offset!(-5);
const NEW_YORK_DAYLIGHT: UtcOffset = offset!(-4);
const SESSION_OPEN_MINUTE: u16 = 9 * 60 + 30;
const SESSION_CLOSE_MINUTE: u16 = 16 * 60;

/// Whether `at` falls inside the regular New York session. Exchange holidays
/// are not modelled.
pub fn is_market_open(at: OffsetDateTime) -> bool {
    let local = at.to_offset(new_york_offset(at));
    if matches!(local.weekday(), Weekday::Saturday | Weekday::Sunday) {
        return false;
    }
    let minute = u16::from(local.hour()) * 60 + u16::from(local.minute());
    (SESSION_OPEN_MINUTE..SESSION_CLOSE_MINUTE).contains(&minute)
}

// Daylight time runs from the second Sunday of March to the first Sunday of
// November. Both switches happen on a Sunday, when the session is closed, so
// the date alone is precise enough.
fn new_york_offset(at: OffsetDateTime) -> UtcOffset {
    let date = at.to_offset(UtcOffset::UTC).date();
    let starts = nth_sunday(date.year(), Month::March, 2);
    let ends = nth_sunday(date.year(), Month::November, 1);
    match (starts, ends) {
        (Some(starts), Some(ends)) if date >= starts && date < ends => NEW_YORK_DAYLIGHT,
        _ => NEW_YORK_STANDARD,
    }
}

fn nth_sunday(year: i32, month: Month, n: u8) -> Option<Date> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let to_sunday = (7 - first.weekday().number_days_from_sunday()) % 7;
    first.checked_add(Duration::days(i64::from(to_sunday) + 7 * (i64::from(n) - 1)))
}

fn money_or_na(value: Option<f64>) -> String {
    value.map(format_money).unwrap_or_else(na)
}

fn text_or_na(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_else(na)
}

fn na() -> String {
    NOT_AVAILABLE.to_owned()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
