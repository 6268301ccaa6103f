//! Expanding (point-in-time) statistics: the value at t only sees the
//! valid inputs at rows `0..=t`.

/// Ascending multiset of the finite values seen so far.
#[derive(Debug, Default, Clone)]
struct SortedHistory {
    values: Vec<f64>,
}

impl SortedHistory {
    fn insert(&mut self, v: f64) {
        let at = self.values.partition_point(|&x| x < v);
        self.values.insert(at, v);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    /// Average-method percentile rank of `v` in (0, 100].
    fn percentile_rank(&self, v: f64) -> f64 {
        let below = self.values.partition_point(|&x| x < v);
        let not_above = self.values.partition_point(|&x| x <= v);
        let equal = not_above - below;
        let rank = below as f64 + (equal as f64 + 1.0) / 2.0;
        100.0 * rank / self.values.len() as f64
    }

    /// Linear-interpolated quantile, `q` in [0, 1].
    fn quantile(&self, q: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return f64::NAN;
        }
        let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        self.values[lo] + (self.values[hi] - self.values[lo]) * frac
    }
}

/// Percentile rank of each row's value among valid values up to that row.
pub fn expanding_percentile_rank(values: &[f64]) -> Vec<f64> {
    let mut history = SortedHistory::default();
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return f64::NAN;
            }
            history.insert(v);
            history.percentile_rank(v)
        })
        .collect()
}

/// Expanding `q` quantile; NaN until `min_count` valid values have been seen.
pub fn expanding_quantile(values: &[f64], q: f64, min_count: usize) -> Vec<f64> {
    let mut history = SortedHistory::default();
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                history.insert(v);
            }
            if history.len() >= min_count.max(1) {
                history.quantile(q)
            } else {
                f64::NAN
            }
        })
        .collect()
}
