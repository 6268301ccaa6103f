//! Numeric thresholds behind every rule condition.

use serde::{Deserialize, Serialize};

/// Rule thresholds. Returns and ratios are fractions (0.02 = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// LOW_VOL: vol_21d at or below this expanding quantile of its history.
    pub low_vol_quantile: f64,
    /// LOW_VOL needs this many valid vol_21d values before it can hold.
    pub low_vol_min_history: usize,
    /// TIGHT_RANGE: range_5d / ma_21 below this.
    pub tight_range_pct: f64,
    /// Consecutive rows for TIGHT_RANGE_3DAY.
    pub tight_range_days: usize,
    /// VOL_DRYUP: volume_ratio below this (and avg_8 < avg_63).
    pub vol_dryup_ratio: f64,
    /// PRICE_BREAKOUT: close within this fraction of the 21-day high.
    pub breakout_proximity: f64,
    /// VOL_CONFIRM: volume above this multiple of the 21-day average.
    pub vol_confirm_mult: f64,
    /// MOMENTUM: return_5d above this.
    pub momentum_return_5d: f64,
    /// REL_STRENGTH: return_21d above this.
    pub rel_strength_return_21d: f64,
    /// STRONG_MOM: return_63d above this.
    pub strong_mom_return_63d: f64,
    /// LOW_DRAWDOWN: drawdown above this (negative fraction).
    pub low_drawdown: f64,
    /// OVEREXTENDED: close / ma_21 - 1 above this.
    pub overextended: f64,
    /// DIVERGENCE: return_5d below this...
    pub divergence_return_5d: f64,
    /// ...while return_63d stays above this.
    pub divergence_return_63d: f64,
    /// CLIMAX_VOL: volume above this multiple of the 63-day average.
    pub climax_vol_mult: f64,
    /// VOLUME_DECLINE: volume below this multiple of the prior 21-day average.
    pub volume_decline_mult: f64,
    /// MOMENTUM_DOWN: return_21d below this.
    pub momentum_down_return_21d: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            low_vol_quantile: 0.20,
            low_vol_min_history: 21,
            tight_range_pct: 0.05,
            tight_range_days: 3,
            vol_dryup_ratio: 0.8,
            breakout_proximity: 0.01,
            vol_confirm_mult: 1.2,
            momentum_return_5d: 0.02,
            rel_strength_return_21d: 0.10,
            strong_mom_return_63d: 0.20,
            low_drawdown: -0.10,
            overextended: 0.075,
            divergence_return_5d: 0.01,
            divergence_return_63d: 0.10,
            climax_vol_mult: 1.5,
            volume_decline_mult: 0.8,
            momentum_down_return_21d: 0.0,
        }
    }
}
