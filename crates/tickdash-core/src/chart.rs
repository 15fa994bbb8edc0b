//! Declarative chart descriptions.
//!
//! [`ChartRenderer`] turns a [`PriceSeries`] into a [`ChartSpec`]: plain data
//! that any front end can draw. The web page maps it onto plotly traces; the
//! terminal front end summarizes it. Rendering is pure, and the only styling
//! input is the static [`Theme`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{format_date, ChartStyle, PriceSeries, Symbol, ValidationError};

/// Fixed color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub rising: &'static str,
    pub falling: &'static str,
    pub line: &'static str,
    pub area_fill: &'static str,
    pub volume: &'static str,
    pub live: &'static str,
}

impl Theme {
    pub const DEFAULT: Theme = Theme {
        rising: "#26a69a",
        falling: "#ef5350",
        line: "#1f77b4",
        area_fill: "rgba(31, 119, 180, 0.3)",
        volume: "#636efa",
        live: "#00ff00",
    };
}

impl Default for Theme {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Rising,
    Falling,
}

/// One OHLC glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub x: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub direction: Direction,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    None,
    ToZero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Candlestick {
        name: String,
        candles: Vec<Candle>,
    },
    Line {
        name: String,
        points: Vec<Point>,
        color: String,
        width: u32,
        fill: Fill,
        fill_color: Option<String>,
    },
    Bar {
        name: String,
        points: Vec<Point>,
        color: String,
    },
}

impl Trace {
    /// Drawn glyphs: candles for a candlestick trace, points otherwise.
    pub fn len(&self) -> usize {
        match self {
            Self::Candlestick { candles, .. } => candles.len(),
            Self::Line { points, .. } | Self::Bar { points, .. } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub height: u32,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    /// Total glyphs across all traces.
    pub fn glyph_count(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }
}

/// Renders price, volume and live-tape charts against a fixed theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer {
    theme: Theme,
}

impl ChartRenderer {
    pub const PRICE_HEIGHT: u32 = 600;
    pub const VOLUME_HEIGHT: u32 = 400;
    pub const LIVE_HEIGHT: u32 = 300;

    pub const fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn render_price(&self, symbol: &Symbol, series: &PriceSeries, style: ChartStyle) -> ChartSpec {
        let trace = match style {
            ChartStyle::Candlestick => Trace::Candlestick {
                name: symbol.to_string(),
                candles: series
                    .iter()
                    .map(|bar| {
                        let direction = if bar.is_rising() {
                            Direction::Rising
                        } else {
                            Direction::Falling
                        };
                        Candle {
                            x: format_date(bar.date),
                            open: bar.open,
                            high: bar.high,
                            low: bar.low,
                            close: bar.close,
                            direction,
                            color: self.direction_color(direction).to_owned(),
                        }
                    })
                    .collect(),
            },
            ChartStyle::Line | ChartStyle::Area => {
                let area = style == ChartStyle::Area;
                Trace::Line {
                    name: symbol.to_string(),
                    points: close_points(series),
                    color: self.theme.line.to_owned(),
                    width: 2,
                    fill: if area { Fill::ToZero } else { Fill::None },
                    fill_color: area.then(|| self.theme.area_fill.to_owned()),
                }
            }
        };

        let title = match style {
            ChartStyle::Candlestick => format!("{symbol} Candlestick Chart"),
            ChartStyle::Line | ChartStyle::Area => format!("{symbol} Price Movement"),
        };

        ChartSpec {
            title,
            x_title: String::from("Date"),
            y_title: String::from("Price ($)"),
            height: Self::PRICE_HEIGHT,
            traces: vec![trace],
        }
    }

    /// Like [`render_price`](Self::render_price) for a style that arrives as text.
    pub fn render_price_named(
        &self,
        symbol: &Symbol,
        series: &PriceSeries,
        style: &str,
    ) -> Result<ChartSpec, ValidationError> {
        Ok(self.render_price(symbol, series, style.parse()?))
    }

    pub fn render_volume(&self, symbol: &Symbol, series: &PriceSeries) -> ChartSpec {
        ChartSpec {
            title: format!("{symbol} Trading Volume"),
            x_title: String::from("Date"),
            y_title: String::from("Volume"),
            height: Self::VOLUME_HEIGHT,
            traces: vec![Trace::Bar {
                name: String::from("Volume"),
                points: series
                    .iter()
                    .map(|bar| Point {
                        x: format_date(bar.date),
                        y: bar.volume as f64,
                    })
                    .collect(),
                color: self.theme.volume.to_owned(),
            }],
        }
    }

    /// Small line chart of prices observed across refreshes.
    pub fn render_live(&self, symbol: &Symbol, tape: &[(OffsetDateTime, f64)]) -> ChartSpec {
        ChartSpec {
            title: format!("{symbol} Live Price Updates"),
            x_title: String::from("Time"),
            y_title: String::from("Price ($)"),
            height: Self::LIVE_HEIGHT,
            traces: vec![Trace::Line {
                name: symbol.to_string(),
                points: tape
                    .iter()
                    .map(|(at, price)| Point {
                        x: format_time(*at),
                        y: *price,
                    })
                    .collect(),
                color: self.theme.live.to_owned(),
                width: 3,
                fill: Fill::None,
                fill_color: None,
            }],
        }
    }

    fn direction_color(&self, direction: Direction) -> &'static str {
        match direction {
            Direction::Rising => self.theme.rising,
            Direction::Falling => self.theme.falling,
        }
    }
}

fn close_points(series: &PriceSeries) -> Vec<Point> {
    series
        .iter()
        .map(|bar| Point {
            x: format_date(bar.date),
            y: bar.close,
        })
        .collect()
}

fn format_time(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}
