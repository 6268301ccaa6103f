//! Simple N-bar returns.
//!
//! return_Nd[t] = close[t] / close[t-N] - 1; undefined for t < N or when
//! either close is invalid.

use crate::domain::PriceBar;
use crate::indicators::close_column;
use crate::indicators::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct Returns {
    period: usize,
    name: String,
}

impl Returns {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "return period must be >= 1");
        Self {
            period,
            name: format!("return_{period}d"),
        }
    }
}

/// Return column over `period` bars from a close column.
pub fn period_returns(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let prev = closes[i - period];
        let curr = closes[i];
        if prev.is_finite() && curr.is_finite() && prev != 0.0 {
            result[i] = curr / prev - 1.0;
        }
    }
    result
}

impl Indicator for Returns {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        period_returns(&close_column(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn one_day_return() {
        let bars = make_bars(&[100.0, 110.0, 99.0]);
        let r = Returns::new(1).compute(&bars);
        assert!(r[0].is_nan());
        assert_approx(r[1], 0.10, DEFAULT_EPSILON);
        assert_approx(r[2], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn undefined_before_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let r = Returns::new(5).compute(&bars);
        assert!(r[..5].iter().all(|v| v.is_nan()));
        assert_approx(r[5], 0.05, DEFAULT_EPSILON);
    }

    #[test]
    fn invalid_close_yields_nan() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars[0].close = -1.0;
        let r = Returns::new(1).compute(&bars);
        assert!(r[1].is_nan());
        assert!(r[2].is_finite());
    }
}
