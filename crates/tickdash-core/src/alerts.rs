use serde::{Deserialize, Serialize};

/// Price thresholds the user wants to be told about. Non-positive thresholds are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDirection {
    Above,
    Below,
}

/// A threshold that the latest price crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub direction: AlertDirection,
    pub threshold: f64,
    pub price: f64,
    pub message: String,
}

impl PriceAlert {
    pub fn new(above: Option<f64>, below: Option<f64>) -> Self {
        Self { above, below }
    }

    pub fn is_active(&self) -> bool {
        active(self.above).is_some() || active(self.below).is_some()
    }

    /// At most one alert fires; `above` is checked first.
    pub fn evaluate(&self, symbol: &str, price: f64) -> Option<TriggeredAlert> {
        if let Some(threshold) = active(self.above).filter(|&t| price > t) {
            return Some(TriggeredAlert {
                direction: AlertDirection::Above,
                threshold,
                price,
                message: format!("{symbol} price is above ${threshold:.2}"),
            });
        }
        active(self.below)
            .filter(|&t| price < t)
            .map(|threshold| TriggeredAlert {
                direction: AlertDirection::Below,
                threshold,
                price,
                message: format!("{symbol} price is below ${threshold:.2}"),
            })
    }
}

fn active(threshold: Option<f64>) -> Option<f64> {
    threshold.filter(|t| t.is_finite() && *t > 0.0)
}
