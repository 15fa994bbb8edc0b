use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Price chart presentation selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
    #[default]
    Candlestick,
    Line,
    Area,
}

impl ChartStyle {
    pub const ALL: [ChartStyle; 3] = [Self::Candlestick, Self::Line, Self::Area];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candlestick => "candlestick",
            Self::Line => "line",
            Self::Area => "area",
        }
    }

    /// Label used by the style selector.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Candlestick => "Candlestick",
            Self::Line => "Line Chart",
            Self::Area => "Area Chart",
        }
    }
}

impl Display for ChartStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartStyle {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candlestick" | "candle" | "ohlc" => Ok(Self::Candlestick),
            "line" | "line chart" => Ok(Self::Line),
            "area" | "area chart" => Ok(Self::Area),
            _ => Err(ValidationError::UnsupportedStyle {
                value: value.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selector_labels_and_short_names() {
        for style in ChartStyle::ALL {
            assert_eq!(style.as_str().parse::<ChartStyle>(), Ok(style));
            assert_eq!(style.label().parse::<ChartStyle>(), Ok(style));
        }
    }

    #[test]
    fn unknown_style_is_rejected_at_the_boundary() {
        let err = "heikin-ashi".parse::<ChartStyle>().expect_err("must fail");
        assert!(matches!(err, ValidationError::UnsupportedStyle { .. }));
    }
}
