use thiserror::Error;

/// Validation errors raised while turning user input into domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("unsupported chart style '{value}', expected one of candlestick, line, area")]
    UnsupportedStyle { value: String },
    #[error("invalid period '{value}', expected one of 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y")]
    InvalidPeriod { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },
    #[error("date range must start within {max_days} days of today, got {start}")]
    LookbackTooLong { start: String, max_days: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,

    #[error("refresh interval {secs}s is outside {min}..={max}s")]
    RefreshIntervalOutOfRange { secs: u64, min: u64, max: u64 },
}
