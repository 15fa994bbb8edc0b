use std::io::Write;

use serde::Serialize;
use tickdash_core::{
    ChartSpec, DashboardState, DashboardView, FailureView, MetricTile, StateKind, Trace,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

/// JSON shape of one render.
#[derive(Debug, Serialize)]
struct StatePayload<'a> {
    state: StateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<&'a DashboardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a FailureView>,
}

pub fn render_state<W: Write>(
    out: &mut W,
    state: &DashboardState,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => render_json(
            out,
            &StatePayload {
                state: state.kind(),
                view: state.view(),
                failure: state.failure(),
            },
            pretty,
        ),
        OutputFormat::Table => {
            match state {
                DashboardState::Displaying(view) => write_dashboard(out, view)?,
                DashboardState::Failed(failure) => write_failure(out, failure)?,
                DashboardState::AwaitingInput | DashboardState::Loading { .. } => {
                    writeln!(out, "state: {}", state.kind().as_str())?;
                }
            }
            Ok(())
        }
    }
}

pub fn render_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

fn write_dashboard<W: Write>(out: &mut W, view: &DashboardView) -> Result<(), CliError> {
    writeln!(out, "{}", view.header)?;
    writeln!(out, "{}", "=".repeat(view.header.chars().count()))?;

    if let Some(alert) = &view.alert {
        writeln!(out, "ALERT: {}", alert.message)?;
    }
    for warning in &view.warnings {
        writeln!(out, "warning: {warning}")?;
    }

    writeln!(out)?;
    write_tiles(out, &view.tiles)?;
    writeln!(out)?;
    write_tiles(out, &view.indicator_tiles)?;

    writeln!(out)?;
    write_chart(out, &view.price_chart)?;
    write_chart(out, &view.volume_chart)?;
    if let Some(live) = &view.live_chart {
        write_chart(out, live)?;
    }

    writeln!(out)?;
    writeln!(out, "Recent data")?;
    writeln!(
        out,
        "  {:<10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>14}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    )?;
    for row in &view.recent_rows {
        writeln!(
            out,
            "  {:<10}  {:>10.2}  {:>10.2}  {:>10.2}  {:>10.2}  {:>14}",
            row.date, row.open, row.high, row.low, row.close, row.volume
        )?;
    }
    if view.recent_rows.is_empty() {
        writeln!(out, "  (no trading days in range)")?;
    }

    writeln!(out)?;
    writeln!(out, "Company")?;
    let company = &view.company;
    for (label, value) in [
        ("Name", &company.name),
        ("Sector", &company.sector),
        ("Industry", &company.industry),
        ("Market Cap", &company.market_cap),
        ("P/E Ratio", &company.pe_ratio),
        ("Dividend Yield", &company.dividend_yield),
    ] {
        writeln!(out, "  {label:<15} {value}")?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Source: {} | Updated: {} | Market: {} | Auto-refresh: {}",
        view.footer.source,
        view.footer.updated_at,
        if view.footer.market_open { "open" } else { "closed" },
        if view.footer.auto_refresh { "on" } else { "off" }
    )?;
    Ok(())
}

fn write_failure<W: Write>(out: &mut W, failure: &FailureView) -> Result<(), CliError> {
    writeln!(out, "{}", failure.message)?;
    writeln!(out, "  code: {}", failure.code)?;
    Ok(())
}

fn write_tiles<W: Write>(out: &mut W, tiles: &[MetricTile]) -> Result<(), CliError> {
    for tile in tiles {
        match &tile.delta {
            Some(delta) => writeln!(out, "  {:<15} {:>16}  {delta}", tile.label, tile.value)?,
            None => writeln!(out, "  {:<15} {:>16}", tile.label, tile.value)?,
        }
    }
    Ok(())
}

fn write_chart<W: Write>(out: &mut W, chart: &ChartSpec) -> Result<(), CliError> {
    let values = chart.traces.first().map(trace_values).unwrap_or_default();
    writeln!(out, "{} ({} points)", chart.title, chart.glyph_count())?;
    if !values.is_empty() {
        writeln!(out, "  {}", sparkline(&values))?;
    }
    Ok(())
}

/// Closing prices for candles, y values otherwise.
fn trace_values(trace: &Trace) -> Vec<f64> {
    match trace {
        Trace::Candlestick { candles, .. } => candles.iter().map(|c| c.close).collect(),
        Trace::Line { points, .. } | Trace::Bar { points, .. } => {
            points.iter().map(|p| p.y).collect()
        }
    }
}

/// Block-character sparkline of the most recent values.
fn sparkline(values: &[f64]) -> String {
    let recent = &values[values.len().saturating_sub(SPARK_WIDTH)..];
    let (min, max) = recent
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    recent
        .iter()
        .map(|value| {
            let level = if span > 0.0 {
                (((value - min) / span) * top as f64).round() as usize
            } else {
                top / 2
            };
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}
