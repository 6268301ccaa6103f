//! Indicator trait and precomputed indicator column store.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once per security before rules and stages are
//! evaluated. Undefined values are `f64::NAN` inside the store and become
//! `None` when rows are assembled.

use crate::domain::PriceBar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "ma_21", "atr").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Container for precomputed indicator columns of one security.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    len: usize,
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    /// New store for a series of `len` bars.
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            series: HashMap::new(),
        }
    }

    /// Number of bars every column covers.
    pub fn bar_count(&self) -> usize {
        self.len
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.len);
        self.series.insert(name.into(), values);
    }

    /// Value at a bar index; `None` when the column is missing or undefined there.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| v.is_finite())
    }

    /// Full column, NaN where undefined. Missing columns read as all-NaN.
    pub fn column(&self, name: &str) -> Vec<f64> {
        self.series
            .get(name)
            .cloned()
            .unwrap_or_else(|| vec![f64::NAN; self.len])
    }

    /// Borrow a column if it was computed.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Number of columns stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
