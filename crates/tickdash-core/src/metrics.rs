//! Scalar summaries derived from a [`PriceSeries`].
//!
//! Everything here is a pure function of the series. Values that cannot be
//! derived (empty series, too few rows for a window) are `None` and rendered
//! as `N/A` by the view layer.

use serde::{Deserialize, Serialize};

use crate::PriceSeries;

/// Rows in a trading year; 52-week figures use this trailing window.
pub const TRADING_DAYS_PER_YEAR: usize = 252;
pub const SHORT_MA_WINDOW: usize = 20;
pub const LONG_MA_WINDOW: usize = 50;
pub const RSI_PERIOD: usize = 14;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Headline figures for the four-up metric display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub latest_close: Option<f64>,
    pub latest_volume: Option<u64>,
    pub period_high: Option<f64>,
    pub period_low: Option<f64>,
}

/// Latest close versus the row before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub previous_close: f64,
    pub change: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiSignal {
    pub fn from_value(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            Self::Overbought
        } else if rsi < RSI_OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        }
    }
}

/// Where the latest close sits relative to a moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Above,
    Below,
}

impl TrendSignal {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Above => "Above",
            Self::Below => "Below",
        }
    }
}

/// Secondary figures shown next to the headline metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub change: Option<PriceChange>,
    pub average_volume: Option<f64>,
    /// Latest volume divided by the average volume of the series.
    pub volume_ratio: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_20_signal: Option<TrendSignal>,
    pub rsi_14: Option<f64>,
    pub rsi_signal: Option<RsiSignal>,
}

/// Stateless metrics computer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsComputer;

impl MetricsComputer {
    pub fn compute(series: &PriceSeries) -> Metrics {
        let Some(last) = series.last() else {
            return Metrics::default();
        };

        Metrics {
            latest_close: Some(last.close),
            latest_volume: Some(last.volume),
            period_high: series.iter().map(|bar| bar.high).reduce(f64::max),
            period_low: series.iter().map(|bar| bar.low).reduce(f64::min),
        }
    }

    pub fn indicators(series: &PriceSeries) -> Indicators {
        let Some(last) = series.last() else {
            return Indicators::default();
        };
        let closes = series.closes();

        let change = series.bars().len().checked_sub(2).map(|i| {
            let previous_close = series.bars()[i].close;
            let change = last.close - previous_close;
            let change_pct = if previous_close == 0.0 {
                0.0
            } else {
                change / previous_close * 100.0
            };
            PriceChange {
                previous_close,
                change,
                change_pct,
            }
        });

        let average_volume =
            series.iter().map(|bar| bar.volume as f64).sum::<f64>() / series.len() as f64;
        let volume_ratio = (average_volume > 0.0).then(|| last.volume as f64 / average_volume);

        let year = series.tail(TRADING_DAYS_PER_YEAR);
        let high_52w = year.iter().map(|bar| bar.high).reduce(f64::max);
        let low_52w = year.iter().map(|bar| bar.low).reduce(f64::min);

        let ma_20 = last_value(&sma(&closes, SHORT_MA_WINDOW));
        let ma_50 = last_value(&sma(&closes, LONG_MA_WINDOW));
        let rsi_14 = last_value(&rsi(&closes, RSI_PERIOD));

        Indicators {
            change,
            average_volume: Some(average_volume),
            volume_ratio,
            high_52w,
            low_52w,
            ma_20,
            ma_50,
            ma_20_signal: ma_20.map(|ma| {
                if last.close > ma {
                    TrendSignal::Above
                } else {
                    TrendSignal::Below
                }
            }),
            rsi_14,
            rsi_signal: rsi_14.map(RsiSignal::from_value),
        }
    }
}

/// Simple moving average. The first `period - 1` values are NaN.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let len = data.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period {
        return result;
    }
    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..len {
        sum += data[i] - data[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// RSI over a rolling simple mean of gains and losses.
///
/// Needs `period + 1` closes for the first value. A window with no losses
/// reads 100; a window with no movement at all reads 50.
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut result = vec![f64::NAN; len];
    if period == 0 || len < period + 1 {
        return result;
    }

    let mut gains = vec![0.0f64; len];
    let mut losses = vec![0.0f64; len];
    for i in 1..len {
        let change = close[i] - close[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    for i in period..len {
        let window = (i + 1 - period)..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        result[i] = match (avg_gain == 0.0, avg_loss == 0.0) {
            (true, true) => 50.0,
            (_, true) => 100.0,
            _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
        };
    }
    result
}

fn last_value(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriceBar;
    use time::macros::date;
    use time::Duration;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = date!(2023 - 01 - 02);
        PriceSeries::from_bars(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| {
                    PriceBar::new(
                        start + Duration::days(i as i64),
                        close,
                        close + 1.0,
                        close - 1.0,
                        close,
                        1_000 * (i as u64 + 1),
                    )
                    .expect("valid bar")
                })
                .collect(),
        )
    }

    #[test]
    fn empty_series_is_unavailable() {
        let metrics = MetricsComputer::compute(&PriceSeries::empty());
        assert_eq!(metrics, Metrics::default());
        assert!(metrics.latest_close.is_none());
        assert_eq!(MetricsComputer::indicators(&PriceSeries::empty()), Indicators::default());
    }

    #[test]
    fn headline_metrics_follow_last_row_and_extremes() {
        let series = series_from_closes(&[10.0, 14.0, 9.0, 12.0]);
        let metrics = MetricsComputer::compute(&series);

        assert_eq!(metrics.latest_close, Some(12.0));
        assert_eq!(metrics.latest_volume, Some(4_000));
        assert_eq!(metrics.period_high, Some(15.0));
        assert_eq!(metrics.period_low, Some(8.0));
        assert_eq!(MetricsComputer::compute(&series), metrics);
    }

    #[test]
    fn change_compares_last_two_closes() {
        let series = series_from_closes(&[100.0, 110.0]);
        let change = MetricsComputer::indicators(&series).change.expect("two rows");
        assert_eq!(change.previous_close, 100.0);
        assert!((change.change - 10.0).abs() < 1e-9);
        assert!((change.change_pct - 10.0).abs() < 1e-9);

        let single = series_from_closes(&[100.0]);
        assert!(MetricsComputer::indicators(&single).change.is_none());
    }

    #[test]
    fn short_series_has_no_moving_averages() {
        let series = series_from_closes(&[1.0; 19]);
        let indicators = MetricsComputer::indicators(&series);
        assert!(indicators.ma_20.is_none());
        assert!(indicators.ma_50.is_none());
        assert_eq!(indicators.rsi_14, Some(50.0));
        assert_eq!(indicators.rsi_signal, Some(RsiSignal::Neutral));
    }

    #[test]
    fn rising_series_is_overbought_and_above_ma() {
        let closes = (0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>();
        let indicators = MetricsComputer::indicators(&series_from_closes(&closes));

        assert_eq!(indicators.rsi_14, Some(100.0));
        assert_eq!(indicators.rsi_signal, Some(RsiSignal::Overbought));
        assert_eq!(indicators.ma_20, Some(119.5));
        assert_eq!(indicators.ma_20_signal, Some(TrendSignal::Above));
    }

    #[test]
    fn year_window_ignores_older_rows() {
        let mut closes = vec![500.0];
        closes.extend(std::iter::repeat(50.0).take(TRADING_DAYS_PER_YEAR));
        let series = series_from_closes(&closes);
        let indicators = MetricsComputer::indicators(&series);

        assert_eq!(indicators.high_52w, Some(51.0));
        assert_eq!(MetricsComputer::compute(&series).period_high, Some(501.0));
    }

    #[test]
    fn sma_matches_hand_computed_values() {
        let values = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(values[0].is_nan());
        assert_eq!(&values[1..], &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn volume_ratio_uses_series_average() {
        let series = series_from_closes(&[1.0, 1.0, 1.0]);
        let indicators = MetricsComputer::indicators(&series);
        assert_eq!(indicators.average_volume, Some(2_000.0));
        assert_eq!(indicators.volume_ratio, Some(1.5));
    }
}
