//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify, over arbitrary price paths:
//! 1. Carry-forward: a row without a full match keeps the previous stage
//! 2. Ratchet: within a run the stop only rises unless the cap engaged
//! 3. Reward:risk: target sits at exactly twice the stop distance
//! 4. Risk score stays in [0, 100] and agrees with its category
//! 5. Stage age counts days within a run and never exceeds the row count

use proptest::prelude::*;
use stagelab_core::domain::{PriceBar, Stage};
use stagelab_core::indicators::RiskCategory;
use stagelab_core::levels::RatchetState;
use stagelab_core::{ClassifierConfig, SecurityTimeline, StagePipeline};

mod common;
use common::{bars_from, series};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_path() -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((-0.06..0.06_f64, 300.0..3000.0_f64), 40..220).prop_map(|steps| {
        let mut price = 100.0;
        let points: Vec<(f64, f64)> = steps
            .into_iter()
            .map(|(r, v)| {
                price = (price * (1.0 + r)).max(1.0);
                (price, v.round())
            })
            .collect();
        bars_from(&points)
    })
}

fn process(bars: Vec<PriceBar>) -> SecurityTimeline {
    StagePipeline::new(&ClassifierConfig::default()).process(&series("P", bars))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn stage_carries_forward(bars in arb_path()) {
        let tl = process(bars);
        let mut prev = Stage::BASELINE;
        for row in &tl.rows {
            let expected = row.matched_stage.unwrap_or(prev);
            prop_assert_eq!(row.stage, expected);
            prev = row.stage;
        }
    }

    #[test]
    fn stop_ratchets_within_run(bars in arb_path()) {
        let tl = process(bars);
        for pair in tl.rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.run.is_run_start() || b.levels.stop_clamped {
                continue;
            }
            if let (Some(prev), Some(cur)) = (a.levels.stop_loss, b.levels.stop_loss) {
                prop_assert!(cur >= prev, "stop loosened from {} to {}", prev, cur);
            }
        }
    }

    #[test]
    fn target_is_twice_the_risk(bars in arb_path()) {
        let tl = process(bars);
        for row in &tl.rows {
            let close = row.indicators.close;
            if let (Some(stop), Some(target)) = (row.levels.stop_loss, row.levels.take_profit) {
                prop_assert!(stop <= close * 0.99 + 1e-9);
                let risk = close - stop;
                prop_assert!((target - close - 2.0 * risk).abs() < 1e-6 * close.max(1.0));
            }
        }
    }

    #[test]
    fn risk_score_bounded(bars in arb_path()) {
        let tl = process(bars);
        for row in &tl.rows {
            match row.indicators.risk_score {
                Some(score) => {
                    prop_assert!((0.0..=100.0).contains(&score), "score {}", score);
                    prop_assert_eq!(row.indicators.risk_category, RiskCategory::from_score(score));
                }
                None => prop_assert!(row.indicators.risk_category.is_none()),
            }
        }
    }

    #[test]
    fn stage_age_counts_run_days(bars in arb_path()) {
        let tl = process(bars);
        let mut age = 0u32;
        for (i, row) in tl.rows.iter().enumerate() {
            age = if row.run.is_run_start() { 1 } else { age + 1 };
            prop_assert_eq!(row.run.stage_age, age);
            prop_assert!(row.run.stage_age as usize <= i + 1);
        }
    }

    /// Stops may only tighten, never loosen.
    #[test]
    fn ratchet_never_loosens(proposals in prop::collection::vec(50.0..150.0_f64, 1..50)) {
        let mut ratchet = RatchetState::new();
        let mut last: Option<f64> = None;
        for p in proposals {
            let applied = ratchet.apply(p);
            if let Some(prev) = last {
                prop_assert!(applied >= prev);
            }
            prop_assert_eq!(ratchet.current_level(), Some(applied));
            last = Some(applied);
        }
    }
}
