//! End-to-end scenarios on synthetic series with known outcomes.

mod common;

use chrono::NaiveDate;
use stagelab_core::domain::{PriceBar, Stage};
use stagelab_core::lifecycle::{ExitReason, LifecycleStep, TradeAction, TradeLifecycle};
use stagelab_core::rules::RuleId;
use stagelab_core::stages::{stage_runs, StageTable};
use stagelab_core::{ClassifierConfig, StagePipeline};

use common::{bars_from, series};

const BREAKOUT_BAR: usize = 250;

/// 250 bars drifting from 112.5 down to ~100 at volume 1000, a +15% bar on
/// 2x volume closing near its high, then 49 flat bars.
fn breakout_bars() -> Vec<PriceBar> {
    let mut points: Vec<(f64, f64)> = (0..BREAKOUT_BAR)
        .map(|i| (112.5 - 0.05 * i as f64, 1000.0))
        .collect();
    let before = points[BREAKOUT_BAR - 1].0;
    let breakout = before * 1.15;
    points.push((breakout, 2000.0));
    points.extend((0..49).map(|_| (breakout, 1000.0)));
    let mut bars = bars_from(&points);
    bars[BREAKOUT_BAR].high = breakout + 0.2;
    bars
}

#[test]
fn breakout_bar_classifies_as_breakout() {
    let bars = breakout_bars();
    assert_eq!(bars.len(), 300);
    let timeline = StagePipeline::new(&ClassifierConfig::default()).process(&series("BRK", bars));
    let row = &timeline.rows[BREAKOUT_BAR];

    assert!(row.rules.contains(RuleId::PriceBreakout));
    assert!(row.rules.contains(RuleId::VolConfirm));
    assert!(row.rules.contains(RuleId::Momentum));
    assert_eq!(row.matched_stage, Some(Stage::Breakout));
    assert_eq!(row.stage, Stage::Breakout);
    assert_eq!(row.stage_name, "BREAKOUT");
    assert_eq!(row.run.stage_age, 1);
    assert!(row.run.is_run_start());

    // Forward-filled into the next bar, which matches nothing new.
    let next = &timeline.rows[BREAKOUT_BAR + 1];
    assert_eq!(next.stage, Stage::Breakout);
    assert_eq!(next.run.stage_age, 2);
    assert_eq!(next.run.run_id, row.run.run_id);

    assert!(timeline.rows[BREAKOUT_BAR..]
        .iter()
        .all(|r| r.stage != Stage::Setup));
}

#[test]
fn breakout_bar_opens_a_trade_with_two_to_one_levels() {
    let timeline =
        StagePipeline::new(&ClassifierConfig::default()).process(&series("BRK", breakout_bars()));
    let row = &timeline.rows[BREAKOUT_BAR];
    let close = row.indicators.close;

    let stop = row.levels.stop_loss.expect("stop defined after warmup");
    let target = row.levels.take_profit.expect("target defined after warmup");
    assert!(stop < close);
    assert!((target - close - 2.0 * (close - stop)).abs() < 1e-9);

    let stop_pct = row.levels.stop_pct.unwrap();
    assert!((1.0..=10.0).contains(&stop_pct), "stop_pct {stop_pct}");
    assert_eq!(row.trade.status.action, TradeAction::Entry);
    assert_eq!(row.trade.entry_price, Some(close));
    assert_eq!(row.trade.status.to_string(), "ENTRY - Stage 1 (BREAKOUT)");
}

#[test]
fn flat_series_is_low_volatility_with_default_kelly() {
    let points = vec![(100.0, 1000.0); 100];
    let timeline =
        StagePipeline::new(&ClassifierConfig::default()).process(&series("FLAT", bars_from(&points)));

    for (i, row) in timeline.rows.iter().enumerate() {
        let ind = &row.indicators;
        if i >= 21 {
            assert_eq!(ind.volatility_21d, Some(0.0), "row {i}");
        } else {
            assert_eq!(ind.volatility_21d, None, "row {i}");
        }
        assert_eq!(ind.kelly_fraction, Some(0.1), "row {i}");
    }

    // LOW_VOL needs 21 defined volatility values before its quantile exists.
    let first_low_vol = timeline
        .rows
        .iter()
        .position(|r| r.rules.contains(RuleId::LowVol))
        .expect("LOW_VOL eventually set");
    assert_eq!(first_low_vol, 41);
    assert!(timeline.rows[first_low_vol..]
        .iter()
        .all(|r| r.rules.contains(RuleId::LowVol)));
}

#[test]
fn stage_three_exits_after_optimal_days() {
    let table = StageTable::default();
    let optimal = table.get(Stage::Sustained).optimal_days as usize;
    assert_eq!(optimal, 42);

    let mut stages = vec![Stage::Setup; 10];
    stages.extend(std::iter::repeat(Stage::Sustained).take(60));
    let runs = stage_runs(&stages, &table);

    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let steps: Vec<LifecycleStep> = stages
        .iter()
        .zip(&runs)
        .enumerate()
        .map(|(i, (&stage, &run))| {
            // Rises 0.5/day from day 10: +21% at day 52, under the 50% cap.
            let close = if i < 10 { 100.0 } else { 100.0 + 0.5 * (i - 10) as f64 };
            LifecycleStep {
                date: start + chrono::Duration::days(i as i64),
                close,
                stage,
                run,
                stop_loss: Some(close * 0.95),
                stop_pct: Some(5.0),
            }
        })
        .collect();

    let states = TradeLifecycle::new(&table).run(&steps);
    assert_eq!(states[10].status.action, TradeAction::Entry);
    assert!(states[11..52]
        .iter()
        .all(|s| s.status.action == TradeAction::Hold));
    assert_eq!(states[52].status.action, TradeAction::Exit);
    assert_eq!(states[52].exit_reason, Some(ExitReason::OptimalDays));
    assert_eq!(states[52].days_held, Some(42));
    assert!(states[53..]
        .iter()
        .all(|s| s.status.action == TradeAction::NoAction && s.exit_price == Some(121.0)));
}
