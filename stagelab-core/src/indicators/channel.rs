//! Price channel: highest high / lowest low over a lookback window.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - Upper: max(high[t-period+1..=t]), named `high_{period}d`
//! - Lower: min(low[t-period+1..=t]), named `low_{period}d`
//!
//! Lookback: period - 1.

use crate::domain::PriceBar;
use crate::indicators::indicator::Indicator;
use crate::indicators::rolling::{rolling_max, rolling_min};
use crate::indicators::{high_column, low_column};

/// Which band of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Channel {
    period: usize,
    band: ChannelBand,
    name: String,
}

impl Channel {
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            band: ChannelBand::Upper,
            name: format!("high_{period}d"),
        }
    }

    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            band: ChannelBand::Lower,
            name: format!("low_{period}d"),
        }
    }
}

impl Indicator for Channel {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        match self.band {
            ChannelBand::Upper => rolling_max(&high_column(bars), self.period),
            ChannelBand::Lower => rolling_min(&low_column(bars), self.period),
        }
    }
}
