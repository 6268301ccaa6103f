//! Concrete indicator implementations.
//!
//! Every per-security feature column implements the `Indicator` trait and is
//! precomputed once over the full series into `IndicatorValues`. Undefined
//! values (warmup, invalid inputs, degenerate windows) are NaN here and
//! become `None` when rows are assembled.
//!
//! Multi-series features (price channel bands) are exposed as separate named
//! instances, keeping the single-series `Indicator` trait unchanged.

pub mod adx;
pub mod atr;
pub mod channel;
pub mod expanding;
pub mod flow;
pub mod indicator;
pub mod returns;
pub mod risk;
pub mod risk_score;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod volatility;
pub mod volume;

pub use adx::Adx;
pub use atr::Atr;
pub use channel::{Channel, ChannelBand};
pub use indicator::{Indicator, IndicatorValues};
pub use returns::Returns;
pub use risk::{CoefficientOfVariation, CvSource, KellyFraction, SharpeRatio, ValueAtRisk};
pub use risk_score::{RiskCategory, RiskComponent};
pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::{TrailingDrawdown, Volatility};
pub use volume::{VolumeAverage, VolumeDelta};

use crate::domain::PriceBar;

/// Close prices; NaN where the close is not a valid (finite, positive) price.
pub fn close_column(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .map(|b| if b.has_valid_close() { b.close } else { f64::NAN })
        .collect()
}

fn finite_column(bars: &[PriceBar], field: impl Fn(&PriceBar) -> f64) -> Vec<f64> {
    bars.iter()
        .map(|b| {
            let v = field(b);
            if v.is_finite() {
                v
            } else {
                f64::NAN
            }
        })
        .collect()
}

pub fn open_column(bars: &[PriceBar]) -> Vec<f64> {
    finite_column(bars, |b| b.open)
}

pub fn high_column(bars: &[PriceBar]) -> Vec<f64> {
    finite_column(bars, |b| b.high)
}

pub fn low_column(bars: &[PriceBar]) -> Vec<f64> {
    finite_column(bars, |b| b.low)
}

/// Volumes; NaN where missing or negative.
pub fn volume_column(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .map(|b| {
            if b.volume.is_finite() && b.volume >= 0.0 {
                b.volume
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples, volume 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
    let with_volume: Vec<_> = data.iter().map(|&(o, h, l, c)| (o, h, l, c, 1000.0)).collect();
    make_ohlcv_bars(&with_volume)
}

/// Bars from explicit (open, high, low, close, volume) tuples.
#[cfg(test)]
pub fn make_ohlcv_bars(data: &[(f64, f64, f64, f64, f64)]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| PriceBar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
