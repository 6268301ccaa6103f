//! Trade Lifecycle State Machine.
//!
//! Per row, in priority order EXIT > ENTRY > HOLD > NO_ACTION. State is
//! scoped to a stage run: a new run clears entry and exit.
//!
//! - EXIT: close at or below the stop in force (previous row of the run),
//!   any DISTRIBUTION row, an EXTENDED row closing below the prior close,
//!   or, with a position open, return at the stage's max target or held
//!   for the stage's optimal days at its min target. EXIT is a signal and
//!   fires without a position too, but only the first one that closes an
//!   open position records the exit.
//! - ENTRY: at most once per run, in stages 0-3, with a stop 1-10% below
//!   close. A signal-only EXIT does not block a later entry.
//! - HOLD: position open.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Stage;
use crate::lifecycle::status::{ExitReason, TradeAction, TradeStatus};
use crate::stages::{RunPosition, StageDef, StageTable};

const MIN_ENTRY_STOP_PCT: f64 = 1.0;
const MAX_ENTRY_STOP_PCT: f64 = 10.0;

/// Inputs the machine reads for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleStep {
    pub date: NaiveDate,
    pub close: f64,
    pub stage: Stage,
    pub run: RunPosition,
    pub stop_loss: Option<f64>,
    pub stop_pct: Option<f64>,
}

/// Trade state after one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeState {
    pub status: TradeStatus,
    pub entry_price: Option<f64>,
    pub entry_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub exit_date: Option<NaiveDate>,
    pub exit_reason: Option<ExitReason>,
    /// Rows since the entry row, frozen at the exit row.
    pub days_held: Option<u32>,
    pub pnl_pct: Option<f64>,
}

impl TradeState {
    pub fn action(&self) -> TradeAction {
        self.status.action
    }

    pub fn is_open(&self) -> bool {
        self.entry_price.is_some() && self.exit_price.is_none()
    }
}

fn pct_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

#[derive(Debug, Default)]
struct RunState {
    entry: Option<(f64, NaiveDate, usize)>,
    exit: Option<(f64, NaiveDate, usize, ExitReason)>,
    stop_in_force: Option<f64>,
}

pub struct TradeLifecycle<'a> {
    table: &'a StageTable,
}

impl<'a> TradeLifecycle<'a> {
    pub fn new(table: &'a StageTable) -> Self {
        Self { table }
    }

    fn exit_reason(
        &self,
        step: &LifecycleStep,
        def: &StageDef,
        state: &RunState,
        prev_close: Option<f64>,
        index: usize,
    ) -> Option<ExitReason> {
        if state.stop_in_force.is_some_and(|stop| step.close <= stop) {
            return Some(ExitReason::StopHit);
        }
        match step.stage {
            Stage::Distribution => return Some(ExitReason::Distribution),
            Stage::Extended if prev_close.is_some_and(|p| step.close < p) => {
                return Some(ExitReason::EarlyTopping)
            }
            _ => {}
        }
        let (entry_price, _, entry_index) = state.entry?;
        if state.exit.is_some() {
            return None;
        }
        let ret = pct_change(entry_price, step.close);
        if ret >= def.max_return_pct {
            return Some(ExitReason::MaxTarget);
        }
        let held = (index - entry_index) as u32;
        if held >= def.optimal_days && ret >= def.min_return_pct {
            return Some(ExitReason::OptimalDays);
        }
        None
    }

    fn entry_allowed(step: &LifecycleStep, state: &RunState) -> bool {
        // An exit is only ever recorded against an entry, so this also
        // blocks re-entry after a closed position.
        if state.entry.is_some() || !step.stage.allows_entry() {
            return false;
        }
        match (step.stop_loss, step.stop_pct) {
            (Some(stop), Some(pct)) => {
                step.close > stop && (MIN_ENTRY_STOP_PCT..=MAX_ENTRY_STOP_PCT).contains(&pct)
            }
            _ => false,
        }
    }

    pub fn run(&self, steps: &[LifecycleStep]) -> Vec<TradeState> {
        let mut state = RunState::default();
        let mut prev_close: Option<f64> = None;
        let mut out = Vec::with_capacity(steps.len());

        for (i, step) in steps.iter().enumerate() {
            if step.run.is_run_start() {
                state = RunState::default();
            }
            let def = self.table.get(step.stage);
            let valid_close = step.close.is_finite() && step.close > 0.0;

            let action = match self.exit_reason(step, def, &state, prev_close, i) {
                Some(reason) if valid_close => {
                    if state.entry.is_some() && state.exit.is_none() {
                        state.exit = Some((step.close, step.date, i, reason));
                    }
                    TradeAction::Exit
                }
                _ if valid_close && Self::entry_allowed(step, &state) => {
                    state.entry = Some((step.close, step.date, i));
                    TradeAction::Entry
                }
                _ if state.entry.is_some() && state.exit.is_none() => TradeAction::Hold,
                _ => TradeAction::NoAction,
            };

            let days_held = state.entry.map(|(_, _, entry_index)| {
                let until = state.exit.map_or(i, |(_, _, exit_index, _)| exit_index.max(entry_index));
                (until - entry_index) as u32
            });
            let pnl_pct = match (state.entry, state.exit) {
                (Some((entry, ..)), Some((exit, ..))) => Some(pct_change(entry, exit)),
                (Some((entry, ..)), None) if valid_close => Some(pct_change(entry, step.close)),
                _ => None,
            };

            out.push(TradeState {
                status: TradeStatus::new(action, step.stage),
                entry_price: state.entry.map(|(p, ..)| p),
                entry_date: state.entry.map(|(_, d, _)| d),
                exit_price: state.exit.map(|(p, ..)| p),
                exit_date: state.exit.map(|(_, d, ..)| d),
                exit_reason: state.exit.map(|(.., r)| r),
                days_held,
                pnl_pct,
            });

            if step.stop_loss.is_some() {
                state.stop_in_force = step.stop_loss;
            }
            if valid_close {
                prev_close = Some(step.close);
            }
        }
        out
    }
}
