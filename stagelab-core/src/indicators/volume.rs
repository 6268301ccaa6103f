//! Volume features: rolling averages and buy/sell pressure.
//!
//! Buy/sell split is a close-vs-open proxy: an up bar counts its whole
//! volume as buying, a down bar as selling, a doji splits it evenly.
//! volume_delta = (buy - sell) / (buy + sell) over a rolling window.

use crate::domain::PriceBar;
use crate::indicators::indicator::Indicator;
use crate::indicators::rolling::{rolling_mean, rolling_sum};
use crate::indicators::volume_column;

#[derive(Debug, Clone)]
pub struct VolumeAverage {
    period: usize,
    name: String,
}

impl VolumeAverage {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume average period must be >= 1");
        Self {
            period,
            name: format!("volume_avg_{period}"),
        }
    }
}

impl Indicator for VolumeAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_mean(&volume_column(bars), self.period)
    }
}

/// Split each bar's volume into (buy, sell) by comparing close with open.
pub fn buy_sell_split(bars: &[PriceBar]) -> (Vec<f64>, Vec<f64>) {
    bars.iter()
        .zip(volume_column(bars))
        .map(|(bar, volume)| {
            if !volume.is_finite() || !bar.close.is_finite() || !bar.open.is_finite() {
                (f64::NAN, f64::NAN)
            } else if bar.close > bar.open {
                (volume, 0.0)
            } else if bar.close < bar.open {
                (0.0, volume)
            } else {
                (volume / 2.0, volume / 2.0)
            }
        })
        .unzip()
}

#[derive(Debug, Clone)]
pub struct VolumeDelta {
    window: usize,
}

impl VolumeDelta {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume delta window must be >= 1");
        Self { window }
    }
}

impl Indicator for VolumeDelta {
    fn name(&self) -> &str {
        "volume_delta"
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let (buy, sell) = buy_sell_split(bars);
        let buy_sum = rolling_sum(&buy, self.window);
        let sell_sum = rolling_sum(&sell, self.window);
        buy_sum
            .iter()
            .zip(&sell_sum)
            .map(|(&b, &s)| {
                let total = b + s;
                if total.is_finite() && total > 0.0 {
                    (b - s) / total
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}
