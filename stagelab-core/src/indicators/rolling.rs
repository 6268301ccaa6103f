//! Right-aligned rolling-window reductions over NaN-tolerant columns.
//!
//! The value at t covers `[t-window+1, t]`. A window containing any NaN
//! (or starting before the series) yields NaN.

/// Apply `reduce` to each complete, all-finite window.
fn rolling_apply(values: &[f64], window: usize, reduce: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().all(|v| v.is_finite()) {
            result[i] = reduce(slice);
        }
    }
    result
}

pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum())
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Rolling standard deviation with `ddof` delta degrees of freedom
/// (0 = population, 1 = sample).
pub fn rolling_std(values: &[f64], window: usize, ddof: usize) -> Vec<f64> {
    if window <= ddof {
        return vec![f64::NAN; values.len()];
    }
    rolling_apply(values, window, |w| std_dev(w, ddof))
}

/// Standard deviation of a finite slice.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - ddof) as f64).sqrt()
}

/// Shift a column forward by `periods` rows (value at t is input at t-periods).
pub fn shift(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in periods..n {
        result[i] = values[i - periods];
    }
    result
}

/// Element-wise ratio; NaN where either side is undefined or the denominator is 0.
pub fn ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(&a, &b)| {
            if a.is_finite() && b.is_finite() && b != 0.0 {
                a / b
            } else {
                f64::NAN
            }
        })
        .collect()
}
