use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Duration};

use crate::{Symbol, ValidationError};

/// Longest lookback the date selector offers (two years, leap day included).
pub const MAX_LOOKBACK_DAYS: i64 = 731;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Trailing lookback presets offered by the date selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1 Day",
            Self::FiveDays => "5 Days",
            Self::OneMonth => "1 Month",
            Self::ThreeMonths => "3 Months",
            Self::SixMonths => "6 Months",
            Self::OneYear => "1 Year",
            Self::TwoYears => "2 Years",
        }
    }

    pub const fn lookback_days(self) -> i64 {
        match self {
            Self::OneDay => 1,
            Self::FiveDays => 5,
            Self::OneMonth => 30,
            Self::ThreeMonths => 91,
            Self::SixMonths => 182,
            Self::OneYear => 365,
            Self::TwoYears => 730,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|period| {
                period.as_str() == normalized || period.label().eq_ignore_ascii_case(&normalized)
            })
            .ok_or_else(|| ValidationError::InvalidPeriod {
                value: value.to_owned(),
            })
    }
}

/// Inclusive calendar range with `start <= end <= today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "crate::domain::iso_date")]
    start: Date,
    #[serde(with = "crate::domain::iso_date")]
    end: Date,
}

impl DateRange {
    /// Validate and normalize a range against `today`.
    ///
    /// An end date in the future is clamped to `today`. The start must not
    /// be after the (clamped) end and must lie within [`MAX_LOOKBACK_DAYS`].
    pub fn new(start: Date, end: Date, today: Date) -> Result<Self, ValidationError> {
        let end = end.min(today);
        if start > end {
            return Err(ValidationError::InvertedDateRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        if (today - start).whole_days() > MAX_LOOKBACK_DAYS {
            return Err(ValidationError::LookbackTooLong {
                start: format_date(start),
                max_days: MAX_LOOKBACK_DAYS,
            });
        }
        Ok(Self { start, end })
    }

    /// Trailing range ending today.
    pub fn trailing(period: Period, today: Date) -> Self {
        let start = today
            .checked_sub(Duration::days(period.lookback_days()))
            .unwrap_or(today);
        Self { start, end: today }
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", format_date(self.start), format_date(self.end))
    }
}

/// How the user picked the date range; resolved against today on every submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeSelection {
    Period { period: Period },
    Custom {
        #[serde(with = "crate::domain::iso_date")]
        start: Date,
        #[serde(with = "crate::domain::iso_date")]
        end: Date,
    },
}

impl Default for RangeSelection {
    fn default() -> Self {
        Self::Period {
            period: Period::default(),
        }
    }
}

impl RangeSelection {
    pub fn resolve(&self, today: Date) -> Result<DateRange, ValidationError> {
        match *self {
            Self::Period { period } => Ok(DateRange::trailing(period, today)),
            Self::Custom { start, end } => DateRange::new(start, end, today),
        }
    }

    /// Human label for headers, e.g. `1 Month` or `2023-01-01..2023-01-10`.
    pub fn label(&self) -> String {
        match self {
            Self::Period { period } => period.label().to_owned(),
            Self::Custom { start, end } => format!("{}..{}", format_date(*start), format_date(*end)),
        }
    }
}

impl From<Period> for RangeSelection {
    fn from(period: Period) -> Self {
        Self::Period { period }
    }
}

/// One fetch request built from the current inputs; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerRequest {
    symbol: Symbol,
    #[serde(with = "crate::domain::iso_date")]
    start_date: Date,
    #[serde(with = "crate::domain::iso_date")]
    end_date: Date,
}

impl TickerRequest {
    pub fn new(symbol: Symbol, range: DateRange) -> Self {
        Self {
            symbol,
            start_date: range.start(),
            end_date: range.end(),
        }
    }

    /// Parse raw user input in one step.
    pub fn parse(symbol: &str, start: &str, end: &str, today: Date) -> Result<Self, ValidationError> {
        let symbol = Symbol::parse(symbol)?;
        let range = DateRange::new(parse_date(start)?, parse_date(end)?, today)?;
        Ok(Self::new(symbol, range))
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn start_date(&self) -> Date {
        self.start_date
    }

    pub const fn end_date(&self) -> Date {
        self.end_date
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}
