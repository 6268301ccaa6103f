//! Volume-flow flags: accumulation days, absorption, block trades and the
//! combined smart-money flag.
//!
//! Flags are plain booleans: an undefined input makes the flag false.

use crate::domain::PriceBar;
use crate::indicators::volume_column;

const ACCUMULATION_VOLUME_MULT: f64 = 1.5;
const ABSORPTION_VOLUME_MULT: f64 = 1.5;
const ABSORPTION_MAX_BODY_RATIO: f64 = 0.3;
const BLOCK_TRADE_VOLUME_MULT: f64 = 5.0;
const SMART_MONEY_WINDOW: usize = 5;
const SMART_MONEY_MIN_ACCUMULATION: usize = 2;

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Up day on heavy volume closing in the upper half of its range and above ma_50.
pub fn accumulation_days(bars: &[PriceBar], volume_avg_21: &[f64], ma_50: &[f64]) -> Vec<bool> {
    let volume = volume_column(bars);
    (0..bars.len())
        .map(|i| {
            if i == 0 {
                return false;
            }
            let bar = &bars[i];
            let (Some(prev_close), Some(avg), Some(ma), Some(v)) = (
                finite(bars[i - 1].close),
                finite(volume_avg_21[i]),
                finite(ma_50[i]),
                finite(volume[i]),
            ) else {
                return false;
            };
            bar.close > prev_close
                && v > ACCUMULATION_VOLUME_MULT * avg
                && bar.close > bar.midpoint()
                && bar.close > ma
        })
        .collect()
}

/// Small real body relative to the range on elevated volume.
pub fn absorption(bars: &[PriceBar], volume_avg_21: &[f64]) -> Vec<bool> {
    let volume = volume_column(bars);
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            let (Some(avg), Some(v)) = (finite(volume_avg_21[i]), finite(volume[i])) else {
                return false;
            };
            if !(range.is_finite() && range > 0.0) || bar.is_void() {
                return false;
            }
            let body_ratio = (bar.close - bar.open).abs() / range;
            body_ratio < ABSORPTION_MAX_BODY_RATIO && v > ABSORPTION_VOLUME_MULT * avg
        })
        .collect()
}

/// Volume more than five times its 63-bar average.
pub fn block_trades(bars: &[PriceBar], volume_avg_63: &[f64]) -> Vec<bool> {
    volume_column(bars)
        .iter()
        .zip(volume_avg_63)
        .map(|(&v, &avg)| match (finite(v), finite(avg)) {
            (Some(v), Some(avg)) => avg > 0.0 && v > BLOCK_TRADE_VOLUME_MULT * avg,
            _ => false,
        })
        .collect()
}

/// Repeated accumulation in the trailing window, or a block trade on an up day.
pub fn smart_money(bars: &[PriceBar], accumulation: &[bool], block: &[bool]) -> Vec<bool> {
    (0..bars.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(SMART_MONEY_WINDOW);
            let recent = accumulation[start..=i].iter().filter(|&&a| a).count();
            let up_day = i > 0 && bars[i].close > bars[i - 1].close;
            recent >= SMART_MONEY_MIN_ACCUMULATION || (block[i] && up_day)
        })
        .collect()
}
