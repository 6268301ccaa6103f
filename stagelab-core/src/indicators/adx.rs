//! ADX: Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period - 1 (first value needs 2 * period bars).

use crate::domain::PriceBar;
use crate::indicators::atr::{true_range, wilder_smooth};
use crate::indicators::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        "adx"
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for i in 1..n {
            let (h, l) = (bars[i].high, bars[i].low);
            let (ph, pl) = (bars[i - 1].high, bars[i - 1].low);
            if !(h.is_finite() && l.is_finite() && ph.is_finite() && pl.is_finite()) {
                continue;
            }

            let high_diff = h - ph;
            let low_diff = pl - l;

            plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 {
                high_diff
            } else {
                0.0
            };
            minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 {
                low_diff
            } else {
                0.0
            };
        }

        let tr = true_range(bars);
        let smooth_tr = wilder_smooth(&tr, self.period);
        let smooth_plus_dm = wilder_smooth(&plus_dm, self.period);
        let smooth_minus_dm = wilder_smooth(&minus_dm, self.period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let (str_, sp, sm) = (smooth_tr[i], smooth_plus_dm[i], smooth_minus_dm[i]);
            if !(str_.is_finite() && sp.is_finite() && sm.is_finite()) || str_ == 0.0 {
                continue;
            }

            let plus_di = 100.0 * sp / str_;
            let minus_di = 100.0 * sm / str_;
            let di_sum = plus_di + minus_di;

            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        wilder_smooth(&dx, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    fn trending(n: usize) -> Vec<(f64, f64, f64, f64)> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 5.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect()
    }

    #[test]
    fn adx_bounds() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let result = Adx::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn adx_strong_trend_is_elevated() {
        let bars = make_ohlc_bars(&trending(20));
        let result = Adx::new(5).compute(&bars);
        let last = result.iter().rev().find(|v| !v.is_nan()).copied();
        assert!(matches!(last, Some(v) if v > 10.0), "got {last:?}");
    }

    #[test]
    fn adx_14_needs_28_bars() {
        let data = trending(28);
        let full = Adx::new(14).compute(&make_ohlc_bars(&data));
        assert!(full[..27].iter().all(|v| v.is_nan()));
        assert!(full[27].is_finite());

        let short = Adx::new(14).compute(&make_ohlc_bars(&data[..27]));
        assert!(short.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn adx_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        assert!(Adx::new(3).compute(&bars).iter().all(|v| v.is_nan()));
    }
}
