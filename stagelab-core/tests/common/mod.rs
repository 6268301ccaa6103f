//! Shared bar builders for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use stagelab_core::domain::{PriceBar, SecuritySeries};

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

/// Bars from (close, volume) pairs: open = previous close, high/low half a
/// point outside the open/close body.
pub fn bars_from(points: &[(f64, f64)]) -> Vec<PriceBar> {
    let mut prev: Option<f64> = None;
    points
        .iter()
        .enumerate()
        .map(|(i, &(close, volume))| {
            let open = prev.unwrap_or(close);
            prev = Some(close);
            PriceBar {
                date: base_date() + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume,
            }
        })
        .collect()
}

/// Deterministic pseudo-random walk (LCG), `n` bars.
pub fn random_walk(n: usize, seed: u64) -> Vec<PriceBar> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut price = 100.0;
    let points: Vec<(f64, f64)> = (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let step = ((state >> 33) % 2001) as f64 / 1000.0 - 1.0;
            price = (price * (1.0 + step * 0.03)).max(5.0);
            let volume = 800.0 + ((state >> 20) % 800) as f64;
            (price, volume)
        })
        .collect();
    bars_from(&points)
}

pub fn series(id: &str, bars: Vec<PriceBar>) -> SecuritySeries {
    SecuritySeries::new(id.into(), bars)
}
