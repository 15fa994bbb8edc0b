//! # Domain Models
//!
//! Value types shared by the fetcher, metrics, charts and controller.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Uppercase-normalized ticker |
//! | [`TickerRequest`] | Symbol plus validated date range for one fetch |
//! | [`DateRange`] | Inclusive range with `start <= end <= today` |
//! | [`Period`] | Trailing lookback presets (1d .. 2y) |
//! | [`PriceBar`] | One trading day of OHLCV |
//! | [`PriceSeries`] | Date-ascending bars, unique per date |
//! | [`CompanyInfo`] | Optional company metadata |
//! | [`ChartStyle`] | Candlestick, line or area |
//!
//! Construction validates invariants, so a `PriceSeries` handed to the
//! metrics computer or chart renderer is always ordered and de-duplicated.

mod models;
mod request;
mod style;
mod symbol;

pub use models::{CompanyInfo, PriceBar, PriceSeries};
pub use request::{
    format_date, parse_date, DateRange, Period, RangeSelection, TickerRequest, MAX_LOOKBACK_DAYS,
};
pub use style::ChartStyle;
pub use symbol::{Symbol, PRESET_SYMBOLS};

/// Serde adapter for `YYYY-MM-DD` dates.
pub(crate) mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::{format_date, parse_date};

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_date(&value).map_err(D::Error::custom)
    }
}
