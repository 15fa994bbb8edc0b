//! CLI argument definitions for tickdash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `show` | Fetch once and print the dashboard |
//! | `watch` | Print the dashboard, then refresh on an interval |
//! | `presets` | List preset symbols, periods and chart styles |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Use the synthetic provider |
//! | `--timeout-ms` | `10000` | Fetch timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! tickdash show AAPL
//! tickdash show NVDA --period 6mo --style area
//! tickdash show AAPL --start 2023-01-01 --end 2023-01-10 --format json --pretty
//! tickdash watch TSLA --interval-secs 60 --alert-above 250
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickdash_core::{
    parse_date, ChartStyle, DashboardInputs, Period, PriceAlert, RangeSelection, Symbol,
    ValidationError,
};

/// Stock dashboard for the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tickdash",
    author,
    version,
    about = "Stock price dashboard for the terminal",
    long_about = "tickdash fetches daily price history and company details for a ticker \
and prints a dashboard: headline metrics, indicators, price and volume charts, \
recent rows and company information.\n\
\n\
Use 'tickdash <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic synthetic data instead of calling Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Fetch timeout in milliseconds (overrides TICKDASH_TIMEOUT_MS).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable dashboard.
    Table,
    /// One JSON object per render.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch once and print the dashboard.
    ///
    /// # Examples
    ///
    ///   tickdash show AAPL
    ///   tickdash show MSFT --period 1y --style line
    Show(DashboardArgs),

    /// Print the dashboard, then re-fetch on an interval until interrupted.
    ///
    /// # Examples
    ///
    ///   tickdash watch AAPL
    ///   tickdash watch NVDA --interval-secs 10 --count 5
    Watch(WatchArgs),

    /// List preset symbols, periods and chart styles.
    Presets,
}

/// What to chart.
#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Ticker symbol, e.g. AAPL. Defaults to TICKDASH_DEFAULT_SYMBOL or AAPL.
    pub symbol: Option<String>,

    /// Trailing period (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y). Ignored with --start.
    #[arg(long)]
    pub period: Option<String>,

    /// First date of a custom range (YYYY-MM-DD).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Last date of a custom range (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Price chart style (candlestick, line, area).
    #[arg(long)]
    pub style: Option<String>,

    /// Raise an alert when the latest close is above this price.
    #[arg(long)]
    pub alert_above: Option<f64>,

    /// Raise an alert when the latest close is below this price.
    #[arg(long)]
    pub alert_below: Option<f64>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Seconds between refreshes (10..=300). Overrides TICKDASH_REFRESH_SECS.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Stop after this many refreshes.
    #[arg(long)]
    pub count: Option<u32>,
}

/// Fallbacks for flags the user left out.
pub struct InputDefaults<'a> {
    pub symbol: &'a Symbol,
    pub period: Period,
    pub style: ChartStyle,
}

impl DashboardArgs {
    pub fn to_inputs(&self, defaults: InputDefaults<'_>) -> Result<DashboardInputs, ValidationError> {
        let symbol = match &self.symbol {
            Some(raw) => Symbol::parse(raw)?,
            None => defaults.symbol.clone(),
        };

        let range = match (&self.start, &self.end) {
            (Some(start), Some(end)) => RangeSelection::Custom {
                start: parse_date(start)?,
                end: parse_date(end)?,
            },
            _ => match &self.period {
                Some(period) => period.parse::<Period>()?.into(),
                None => defaults.period.into(),
            },
        };

        let style = match &self.style {
            Some(style) => style.parse()?,
            None => defaults.style,
        };

        Ok(DashboardInputs::new(symbol)
            .with_range(range)
            .with_style(style)
            .with_alert(PriceAlert::new(self.alert_above, self.alert_below)))
    }
}
