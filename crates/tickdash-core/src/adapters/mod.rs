//! Market data providers.
//!
//! | Adapter | Backing | Notes |
//! |---------|---------|-------|
//! | [`YahooAdapter`] | Yahoo Finance v8 chart + v10 quoteSummary | crumb auth, retry, per-call timeout |
//! | [`SyntheticSource`] | Deterministic generator | offline mode and demos |

mod synthetic;
mod yahoo;

pub use synthetic::SyntheticSource;
pub use yahoo::YahooAdapter;
