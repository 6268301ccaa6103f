//! IndicatorRow: one bar with every computed feature attached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::indicators::RiskCategory;

/// A price bar augmented with the Indicator Engine's features.
///
/// Numeric features are `None` wherever they are undefined (warmup, invalid
/// inputs, degenerate windows). Flags are plain booleans: an undefined input
/// reads as `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    pub return_1d: Option<f64>,
    pub return_5d: Option<f64>,
    pub return_21d: Option<f64>,
    pub return_63d: Option<f64>,

    pub ma_5: Option<f64>,
    pub ma_21: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_63: Option<f64>,
    pub ma_126: Option<f64>,
    pub ma_252: Option<f64>,

    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,

    pub high_5d: Option<f64>,
    pub low_5d: Option<f64>,
    pub low_10d: Option<f64>,
    pub high_21d: Option<f64>,
    pub low_21d: Option<f64>,
    pub range_5d: Option<f64>,
    pub range_21d: Option<f64>,
    pub range_contraction: Option<f64>,

    pub volume_avg_8: Option<f64>,
    pub volume_avg_21: Option<f64>,
    pub volume_avg_63: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume_delta: Option<f64>,

    pub volatility_5d: Option<f64>,
    pub volatility_21d: Option<f64>,
    pub drawdown: Option<f64>,
    pub overextension: Option<f64>,

    pub accumulation_day: bool,
    pub absorption: bool,
    pub block_trade: bool,
    pub smart_money: bool,

    pub var_1d: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown_252d: Option<f64>,
    pub kelly_fraction: Option<f64>,
    pub volume_cv: Option<f64>,
    pub price_cv: Option<f64>,
    pub risk_score: Option<f64>,
    pub risk_category: Option<RiskCategory>,
}

impl IndicatorRow {
    /// Row carrying only the bar, every feature undefined.
    pub fn from_bar(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ..Self::default()
        }
    }

    /// The close if it is a usable price.
    pub fn valid_close(&self) -> Option<f64> {
        (self.close.is_finite() && self.close > 0.0).then_some(self.close)
    }
}
