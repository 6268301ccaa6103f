//! Annualised return volatility and trailing drawdown.

use crate::domain::PriceBar;
use crate::indicators::indicator::Indicator;
use crate::indicators::returns::period_returns;
use crate::indicators::rolling::rolling_mean;
use crate::indicators::close_column;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Rolling population volatility of 1-day returns, annualised by sqrt(252).
///
/// vol = sqrt(max(mean(r²) - mean(r)², 0)) * sqrt(252)
#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    name: String,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volatility period must be >= 1");
        Self {
            period,
            name: format!("volatility_{period}d"),
        }
    }
}

/// Volatility of an already computed return column.
pub fn annualised_volatility(returns: &[f64], period: usize) -> Vec<f64> {
    let squared: Vec<f64> = returns.iter().map(|r| r * r).collect();
    let mean_sq = rolling_mean(&squared, period);
    let mean = rolling_mean(returns, period);
    mean_sq
        .iter()
        .zip(&mean)
        .map(|(&sq, &m)| {
            if sq.is_finite() && m.is_finite() {
                (sq - m * m).max(0.0).sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
            } else {
                f64::NAN
            }
        })
        .collect()
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let returns = period_returns(&close_column(bars), 1);
        annualised_volatility(&returns, self.period)
    }
}

/// Worst peak-to-trough decline over a trailing window of valid closes.
///
/// Invalid closes inside the window are skipped rather than poisoning it.
/// Values are fractions and never positive.
#[derive(Debug, Clone)]
pub struct TrailingDrawdown {
    window: usize,
    min_valid: usize,
    name: String,
}

impl TrailingDrawdown {
    pub fn new(name: impl Into<String>, window: usize, min_valid: usize) -> Self {
        assert!(window >= 1, "drawdown window must be >= 1");
        Self {
            window,
            min_valid: min_valid.max(1),
            name: name.into(),
        }
    }

    /// 63-bar drawdown used by LOW_DRAWDOWN.
    pub fn quarter() -> Self {
        Self::new("drawdown", 63, 5)
    }

    /// 252-bar drawdown used by the risk score.
    pub fn year() -> Self {
        Self::new("max_drawdown_252d", 252, 1)
    }
}

/// Worst drawdown of a slice of closes, skipping non-finite entries.
fn worst_drawdown(closes: &[f64], min_valid: usize) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    let mut valid = 0;
    for &c in closes.iter().filter(|c| c.is_finite()) {
        valid += 1;
        peak = peak.max(c);
        worst = worst.min(c / peak - 1.0);
    }
    if valid < min_valid {
        f64::NAN
    } else {
        worst
    }
}

impl Indicator for TrailingDrawdown {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.min_valid - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes = close_column(bars);
        (0..closes.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.window);
                worst_drawdown(&closes[start..=i], self.min_valid)
            })
            .collect()
    }
}
