//! Synthetic price universes for demos, benches and tests.
//!
//! Each security follows a seeded random walk that switches between
//! regimes (quiet base, trend, decline) and occasionally gaps up on heavy
//! volume, so every stage shows up somewhere in a large enough universe.
//! Output depends only on the seed and the security id.

use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use stagelab_core::data::DataError;
use stagelab_core::domain::{PriceBar, SecurityId, SecuritySeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regime {
    Quiet,
    Trend,
    Decline,
}

impl Regime {
    /// (daily drift, daily volatility, volume multiplier)
    fn params(self) -> (f64, f64, f64) {
        match self {
            Regime::Quiet => (0.0, 0.006, 0.7),
            Regime::Trend => (0.004, 0.012, 1.3),
            Regime::Decline => (-0.003, 0.018, 0.9),
        }
    }

    fn next(self, rng: &mut StdRng) -> Self {
        // Regimes last ~30 trading days on average.
        if rng.gen_bool(1.0 / 30.0) {
            match rng.gen_range(0..3) {
                0 => Regime::Quiet,
                1 => Regime::Trend,
                _ => Regime::Decline,
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub securities: usize,
    pub start: NaiveDate,
    /// Trading days (weekdays) per security.
    pub days: usize,
    pub seed: u64,
    /// Probability of a breakout gap on any given day.
    pub gap_probability: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            securities: 50,
            start: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default(),
            days: 520,
            seed: 42,
            gap_probability: 0.004,
        }
    }
}

fn rng_for(seed: u64, id: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(id.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += chrono::Duration::days(1);
    }
    date
}

/// One synthetic security.
pub fn generate_series(id: &str, config: &SyntheticConfig) -> SecuritySeries {
    let mut rng = rng_for(config.seed, id);
    let mut price: f64 = rng.gen_range(20.0..500.0);
    let base_volume: f64 = rng.gen_range(50_000.0..2_000_000.0);
    let mut regime = Regime::Quiet;
    let mut date = next_weekday(config.start);
    let mut bars = Vec::with_capacity(config.days);

    for _ in 0..config.days {
        regime = regime.next(&mut rng);
        let (drift, vol, volume_mult) = regime.params();
        // Uniform shock scaled to unit variance.
        let shock = rng.gen_range(-1.0..1.0) * 3f64.sqrt();
        let gap = rng.gen_bool(config.gap_probability.clamp(0.0, 1.0));
        let daily_return = if gap {
            rng.gen_range(0.08..0.18)
        } else {
            drift + vol * shock
        };

        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.5);
        let wick = vol * rng.gen_range(0.2..1.0);
        let high = if gap { close * 1.002 } else { open.max(close) * (1.0 + wick) };
        let low = open.min(close) * (1.0 - wick);
        let noise: f64 = rng.gen_range(0.6..1.4);
        let volume = (base_volume * volume_mult * noise * if gap { 2.5 } else { 1.0 }).round();

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
        date = next_weekday(date + chrono::Duration::days(1));
    }
    SecuritySeries::new(SecurityId::new(id), bars)
}

/// Ids are `SYN0001`, `SYN0002`, ...
pub fn generate_universe(config: &SyntheticConfig) -> Vec<SecuritySeries> {
    (1..=config.securities)
        .map(|i| generate_series(&format!("SYN{i:04}"), config))
        .collect()
}

/// Write series in the long CSV layout `CsvPriceSource` reads.
pub fn write_prices_csv(series: &[SecuritySeries], path: &Path) -> Result<(), DataError> {
    let csv_err = |e: csv::Error| DataError::Csv(e.to_string());
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(["security_id", "date", "open", "high", "low", "close", "volume"])
        .map_err(csv_err)?;
    for s in series {
        for bar in s.bars() {
            wtr.write_record([
                s.id.as_str(),
                &bar.date.to_string(),
                &format!("{:.4}", bar.open),
                &format!("{:.4}", bar.high),
                &format!("{:.4}", bar.low),
                &format!("{:.4}", bar.close),
                &format!("{:.0}", bar.volume),
            ])
            .map_err(csv_err)?;
        }
    }
    wtr.flush().map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })
}
