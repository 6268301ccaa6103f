//! Per-security risk metrics: one-day VaR, Sharpe ratio, Kelly fraction and
//! coefficients of variation.

use crate::domain::PriceBar;
use crate::indicators::indicator::Indicator;
use crate::indicators::returns::period_returns;
use crate::indicators::rolling::{rolling_mean, rolling_std};
use crate::indicators::volatility::TRADING_DAYS_PER_YEAR;
use crate::indicators::{close_column, volume_column};

/// Standard normal quantile at 5%.
pub const Z_05: f64 = -1.6448536269514722;
pub const SHARPE_BOUND: f64 = 10.0;
pub const KELLY_DEFAULT: f64 = 0.1;
pub const KELLY_MIN_OBSERVATIONS: usize = 21;

fn daily_returns(bars: &[PriceBar]) -> Vec<f64> {
    period_returns(&close_column(bars), 1)
}

/// Parametric one-day VaR at 95%: mean + z·sd over a rolling window.
#[derive(Debug, Clone)]
pub struct ValueAtRisk {
    window: usize,
}

impl ValueAtRisk {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "VaR window must be >= 2");
        Self { window }
    }
}

impl Indicator for ValueAtRisk {
    fn name(&self) -> &str {
        "var_1d"
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let returns = daily_returns(bars);
        let mean = rolling_mean(&returns, self.window);
        let sd = rolling_std(&returns, self.window, 1);
        mean.iter().zip(&sd).map(|(m, s)| m + Z_05 * s).collect()
    }
}

/// Annualised rolling Sharpe ratio (zero risk-free rate), clamped to ±10.
#[derive(Debug, Clone)]
pub struct SharpeRatio {
    window: usize,
}

impl SharpeRatio {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "Sharpe window must be >= 2");
        Self { window }
    }
}

impl Indicator for SharpeRatio {
    fn name(&self) -> &str {
        "sharpe_ratio"
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let returns = daily_returns(bars);
        let mean = rolling_mean(&returns, self.window);
        let sd = rolling_std(&returns, self.window, 1);
        mean.iter()
            .zip(&sd)
            .map(|(&m, &s)| {
                if m.is_finite() && s.is_finite() && s > 0.0 {
                    (m / s * TRADING_DAYS_PER_YEAR.sqrt()).clamp(-SHARPE_BOUND, SHARPE_BOUND)
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

/// Kelly fraction from the expanding return history.
///
/// At row t only returns up to t are used. Falls back to 0.1 with fewer
/// than 21 observations or without both wins and losses.
#[derive(Debug, Clone, Default)]
pub struct KellyFraction;

#[derive(Debug, Default, Clone, Copy)]
struct WinLoss {
    observations: usize,
    wins: usize,
    losses: usize,
    win_sum: f64,
    loss_sum: f64,
}

impl WinLoss {
    fn push(&mut self, r: f64) {
        self.observations += 1;
        if r > 0.0 {
            self.wins += 1;
            self.win_sum += r;
        } else if r < 0.0 {
            self.losses += 1;
            self.loss_sum += -r;
        }
    }

    fn fraction(&self) -> f64 {
        if self.observations < KELLY_MIN_OBSERVATIONS || self.wins == 0 || self.losses == 0 {
            return KELLY_DEFAULT;
        }
        let win_rate = self.wins as f64 / self.observations as f64;
        let avg_win = self.win_sum / self.wins as f64;
        let avg_loss = self.loss_sum / self.losses as f64;
        let payoff = avg_win / avg_loss;
        if !payoff.is_finite() || payoff <= 0.0 {
            return KELLY_DEFAULT;
        }
        ((win_rate * (payoff + 1.0) - 1.0) / payoff).clamp(0.0, 1.0)
    }
}

impl Indicator for KellyFraction {
    fn name(&self) -> &str {
        "kelly_fraction"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let mut acc = WinLoss::default();
        daily_returns(bars)
            .into_iter()
            .map(|r| {
                if r.is_finite() {
                    acc.push(r);
                }
                acc.fraction()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvSource {
    Volume,
    Close,
}

/// Rolling coefficient of variation: sample sd / mean.
#[derive(Debug, Clone)]
pub struct CoefficientOfVariation {
    source: CvSource,
    window: usize,
}

impl CoefficientOfVariation {
    pub fn new(source: CvSource, window: usize) -> Self {
        assert!(window >= 2, "CV window must be >= 2");
        Self { source, window }
    }
}

impl Indicator for CoefficientOfVariation {
    fn name(&self) -> &str {
        match self.source {
            CvSource::Volume => "volume_cv",
            CvSource::Close => "price_cv",
        }
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let values = match self.source {
            CvSource::Volume => volume_column(bars),
            CvSource::Close => close_column(bars),
        };
        let mean = rolling_mean(&values, self.window);
        let sd = rolling_std(&values, self.window, 1);
        mean.iter()
            .zip(&sd)
            .map(|(&m, &s)| if m.is_finite() && m != 0.0 { s / m } else { f64::NAN })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_ohlcv_bars, DEFAULT_EPSILON};

    fn alternating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 102.0 }).collect()
    }

    #[test]
    fn var_needs_full_window_of_returns() {
        let bars = make_bars(&alternating(30));
        let var = ValueAtRisk::new(21).compute(&bars);
        assert!(var[20].is_nan());
        assert!(var[21].is_finite());
        assert!(var[21] < 0.0);
    }

    #[test]
    fn sharpe_undefined_for_flat_series() {
        let bars = make_bars(&[50.0; 30]);
        let sharpe = SharpeRatio::new(21).compute(&bars);
        assert!(sharpe.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sharpe_is_clamped() {
        // Steady gains with a tiny wobble: huge Sharpe.
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 * 1.01f64.powi(i) * if i % 2 == 0 { 1.0 } else { 1.0001 })
            .collect();
        let sharpe = SharpeRatio::new(21).compute(&make_bars(&closes));
        assert_approx(sharpe[39], SHARPE_BOUND, DEFAULT_EPSILON);
    }

    #[test]
    fn kelly_defaults_until_enough_history() {
        let bars = make_bars(&alternating(15));
        let kelly = KellyFraction.compute(&bars);
        assert!(kelly.iter().all(|&k| k == KELLY_DEFAULT));
    }

    #[test]
    fn kelly_default_for_flat_series() {
        let kelly = KellyFraction.compute(&make_bars(&[100.0; 100]));
        assert!(kelly.iter().all(|&k| k == KELLY_DEFAULT));
    }

    #[test]
    fn kelly_formula() {
        // Three up days of +10% then one down of -5%, repeated.
        let mut closes = vec![100.0];
        for i in 0..40 {
            let last = *closes.last().unwrap();
            closes.push(if i % 4 == 3 { last * 0.95 } else { last * 1.10 });
        }
        let kelly = KellyFraction.compute(&make_bars(&closes));
        // 40 returns: 30 wins of 10%, 10 losses of 5%.
        let win_rate: f64 = 0.75;
        let payoff: f64 = 2.0;
        let expected = (win_rate * (payoff + 1.0) - 1.0) / payoff;
        assert_approx(kelly[40], expected.clamp(0.0, 1.0), 1e-9);
    }

    #[test]
    fn cv_of_volume() {
        let bars = make_ohlcv_bars(&[
            (10.0, 11.0, 9.0, 10.0, 100.0),
            (10.0, 11.0, 9.0, 10.0, 200.0),
            (10.0, 11.0, 9.0, 10.0, 300.0),
        ]);
        let cv = CoefficientOfVariation::new(CvSource::Volume, 3).compute(&bars);
        assert_approx(cv[2], 100.0 / 200.0, DEFAULT_EPSILON);
        let zero = make_ohlcv_bars(&[(10.0, 11.0, 9.0, 10.0, 0.0), (10.0, 11.0, 9.0, 10.0, 0.0)]);
        assert!(CoefficientOfVariation::new(CvSource::Volume, 2).compute(&zero)[1].is_nan());
    }
}
