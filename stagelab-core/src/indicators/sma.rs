//! Simple Moving Average (SMA) of close.
//!
//! Right-aligned rolling mean; lookback: period - 1.

use crate::domain::PriceBar;
use crate::indicators::indicator::Indicator;
use crate::indicators::{close_column, rolling::rolling_mean};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("ma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_mean(&close_column(bars), self.period)
    }
}
