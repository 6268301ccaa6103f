//! Dynamic Level Calculator: stage-conditioned stop-loss and take-profit.
//!
//! base_stop = close - atr * base_stop_pct * time_factor * vol_factor / momentum_factor
//! stop      = max(base_stop, stage floors), ratcheted within the run,
//!             capped at 99% of close
//! target    = close + 2 * (close - stop)

use serde::{Deserialize, Serialize};

use crate::domain::Stage;
use crate::engine::IndicatorRow;
use crate::levels::ratchet::RatchetState;
use crate::stages::{RunPosition, StageDef, StageTable};

pub const REWARD_RISK: f64 = 2.0;
pub const STOP_CAP: f64 = 0.99;
const VOL_REFERENCE: f64 = 0.20;
const VOL_FACTOR_MAX: f64 = 1.5;
const MOMENTUM_SCALE: f64 = 10.0;
const MIN_TIME_FACTOR: f64 = 0.5;
const EPSILON: f64 = 1e-12;

/// Stop/target levels for one row. All prices are `None` when close or ATR
/// is undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub base_stop_pct: f64,
    pub stop_loss: Option<f64>,
    /// Distance to the stop in percent of close.
    pub stop_pct: Option<f64>,
    pub take_profit: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub risk_reward: Option<f64>,
    /// The ratcheted stop hit the 99%-of-close cap on this row.
    pub stop_clamped: bool,
}

/// Linear decay from 1.0 at the first day of the run to 0.5 at optimal_days.
pub fn time_factor(stage_age: u32, optimal_days: u32) -> f64 {
    if optimal_days == 0 {
        return MIN_TIME_FACTOR;
    }
    let elapsed = stage_age.saturating_sub(1) as f64;
    (1.0 - 0.5 * elapsed / optimal_days as f64).max(MIN_TIME_FACTOR)
}

pub fn vol_factor(volatility_21d: Option<f64>) -> f64 {
    volatility_21d.map_or(1.0, |v| (v / VOL_REFERENCE).min(VOL_FACTOR_MAX))
}

pub fn momentum_factor(return_21d: Option<f64>) -> f64 {
    return_21d.map_or(1.0, |r| 1.0 + (r * MOMENTUM_SCALE).clamp(0.0, 1.0))
}

/// Stop candidate before the ratchet: base stop raised to the stage floors.
pub fn candidate_stop(row: &IndicatorRow, def: &StageDef, stage_age: u32) -> Option<f64> {
    let close = row.valid_close()?;
    let atr = row.atr?;
    let distance = atr
        * def.base_stop_pct
        * time_factor(stage_age, def.optimal_days)
        * vol_factor(row.volatility_21d)
        / momentum_factor(row.return_21d).max(EPSILON);
    let base = close - distance;
    Some(
        def.floors
            .iter()
            .filter_map(|f| f.level(row))
            .fold(base, f64::max),
    )
}

pub struct LevelCalculator<'a> {
    table: &'a StageTable,
}

impl<'a> LevelCalculator<'a> {
    pub fn new(table: &'a StageTable) -> Self {
        Self { table }
    }

    pub fn compute(
        &self,
        rows: &[IndicatorRow],
        stages: &[Stage],
        runs: &[RunPosition],
    ) -> Vec<RiskLevels> {
        let mut ratchet = RatchetState::new();

        rows.iter()
            .zip(stages)
            .zip(runs)
            .map(|((row, &stage), run)| {
                if run.is_run_start() {
                    ratchet.clear();
                }
                let def = self.table.get(stage);
                let mut levels = RiskLevels {
                    base_stop_pct: def.base_stop_pct,
                    ..RiskLevels::default()
                };
                let (Some(close), Some(candidate)) =
                    (row.valid_close(), candidate_stop(row, def, run.stage_age))
                else {
                    return levels;
                };

                // The cap limits this row only; the high-water mark survives it.
                let ratcheted = ratchet.apply(candidate);
                let cap = close * STOP_CAP;
                levels.stop_clamped = ratcheted >= cap;
                let stop = ratcheted.min(cap);

                let risk = close - stop;
                let take_profit = close + risk * REWARD_RISK;
                levels.stop_loss = Some(stop);
                levels.stop_pct = Some(risk / close * 100.0);
                levels.take_profit = Some(take_profit);
                levels.take_profit_pct = Some((take_profit - close) / close * 100.0);
                levels.risk_reward = (risk.abs() > EPSILON).then(|| (take_profit - close) / risk);
                levels
            })
            .collect()
    }
}
