//! Rule Evaluator: indicator rows in, one `RuleFlags` per row out.
//!
//! Most rules read a single row. LOW_VOL (expanding quantile),
//! TIGHT_RANGE_3DAY (streak) and VOLUME_DECLINE (previous row's average)
//! also look backwards, so evaluation is one left-to-right pass over the
//! security. Nothing reads forward.

use crate::engine::IndicatorRow;
use crate::indicators::expanding::expanding_quantile;
use crate::rules::flags::{RuleFlags, RuleId};
use crate::rules::thresholds::RuleThresholds;

#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    thresholds: RuleThresholds,
}

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

impl RuleEvaluator {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, rows: &[IndicatorRow]) -> Vec<RuleFlags> {
        let th = &self.thresholds;
        let vol: Vec<f64> = rows
            .iter()
            .map(|r| r.volatility_21d.unwrap_or(f64::NAN))
            .collect();
        let low_vol_cutoff = expanding_quantile(&vol, th.low_vol_quantile, th.low_vol_min_history);

        let mut tight_streak = 0usize;
        let mut prev_avg_21: Option<f64> = None;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let close = row.valid_close();
                let volume = (row.volume.is_finite() && row.volume >= 0.0).then_some(row.volume);
                let scaled = |v: Option<f64>, k: f64| v.map(|v| v * k);

                let tight = match (row.range_5d, row.ma_21) {
                    (Some(range), Some(ma)) if ma > 0.0 => range / ma < th.tight_range_pct,
                    _ => false,
                };
                tight_streak = if tight { tight_streak + 1 } else { 0 };

                let mut flags = RuleFlags::empty();
                flags.set(
                    RuleId::LowVol,
                    row.volatility_21d.is_some()
                        && low_vol_cutoff[i].is_finite()
                        && vol[i] <= low_vol_cutoff[i],
                );
                flags.set(RuleId::TightRange1Day, tight);
                flags.set(
                    RuleId::TightRange3Day,
                    tight_streak >= th.tight_range_days.max(1),
                );
                flags.set(
                    RuleId::VolDryup,
                    gt(Some(th.vol_dryup_ratio), row.volume_ratio)
                        && gt(row.volume_avg_63, row.volume_avg_8),
                );

                flags.set(
                    RuleId::PriceBreakout,
                    match (close, row.high_21d) {
                        (Some(c), Some(h)) => c >= h * (1.0 - th.breakout_proximity),
                        _ => false,
                    },
                );
                flags.set(
                    RuleId::VolConfirm,
                    gt(volume, scaled(row.volume_avg_21, th.vol_confirm_mult)),
                );
                flags.set(
                    RuleId::Momentum,
                    gt(row.return_5d, Some(th.momentum_return_5d)),
                );

                flags.set(RuleId::AboveMa21, gt(close, row.ma_21));
                flags.set(RuleId::MaCross, gt(row.ma_21, row.ma_63));
                flags.set(
                    RuleId::RelStrength,
                    gt(row.return_21d, Some(th.rel_strength_return_21d)),
                );

                flags.set(RuleId::AboveMa126, gt(close, row.ma_126));
                flags.set(
                    RuleId::MaStack,
                    gt(row.ma_21, row.ma_63) && gt(row.ma_63, row.ma_126),
                );
                flags.set(
                    RuleId::StrongMom,
                    gt(row.return_63d, Some(th.strong_mom_return_63d)),
                );
                flags.set(RuleId::LowDrawdown, gt(row.drawdown, Some(th.low_drawdown)));

                flags.set(
                    RuleId::Overextended,
                    gt(row.overextension, Some(th.overextended)),
                );
                flags.set(
                    RuleId::Divergence,
                    gt(Some(th.divergence_return_5d), row.return_5d)
                        && gt(row.return_63d, Some(th.divergence_return_63d)),
                );
                flags.set(
                    RuleId::ClimaxVol,
                    gt(volume, scaled(row.volume_avg_63, th.climax_vol_mult)),
                );

                flags.set(RuleId::PriceBelowMa21, gt(row.ma_21, close));
                flags.set(
                    RuleId::VolumeDecline,
                    gt(scaled(prev_avg_21, th.volume_decline_mult), volume),
                );
                flags.set(
                    RuleId::MomentumDown,
                    gt(Some(th.momentum_down_return_21d), row.return_21d),
                );

                prev_avg_21 = row.volume_avg_21;
                flags
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(close: f64) -> IndicatorRow {
        IndicatorRow {
            close,
            open: close,
            high: close,
            low: close,
            volume: 1000.0,
            ..IndicatorRow::default()
        }
    }

    fn eval(rows: &[IndicatorRow]) -> Vec<RuleFlags> {
        RuleEvaluator::default().evaluate(rows)
    }

    #[test]
    fn undefined_inputs_make_every_flag_false() {
        let flags = eval(&[row(100.0)]);
        assert!(flags[0].is_empty());
    }

    #[test]
    fn breakout_rules() {
        let r = IndicatorRow {
            high_21d: Some(100.5),
            volume: 1300.0,
            volume_avg_21: Some(1000.0),
            return_5d: Some(0.03),
            ..row(100.0)
        };
        let flags = eval(&[r])[0];
        assert!(flags.contains(RuleId::PriceBreakout));
        assert!(flags.contains(RuleId::VolConfirm));
        assert!(flags.contains(RuleId::Momentum));
    }

    #[test]
    fn breakout_needs_close_near_high() {
        let r = IndicatorRow {
            high_21d: Some(102.0),
            ..row(100.0)
        };
        assert!(!eval(&[r])[0].contains(RuleId::PriceBreakout));
    }

    #[test]
    fn sustained_rules() {
        let r = IndicatorRow {
            ma_21: Some(95.0),
            ma_63: Some(90.0),
            ma_126: Some(85.0),
            return_63d: Some(0.25),
            drawdown: Some(-0.05),
            ..row(100.0)
        };
        let flags = eval(&[r])[0];
        for rule in [
            RuleId::AboveMa126,
            RuleId::MaStack,
            RuleId::StrongMom,
            RuleId::LowDrawdown,
            RuleId::AboveMa21,
            RuleId::MaCross,
        ] {
            assert!(flags.contains(rule), "{rule} should hold");
        }
    }

    #[test]
    fn tight_range_streak() {
        let tight = IndicatorRow {
            range_5d: Some(2.0),
            ma_21: Some(100.0),
            ..row(100.0)
        };
        let loose = IndicatorRow {
            range_5d: Some(8.0),
            ..tight.clone()
        };
        let flags = eval(&[tight.clone(), tight.clone(), loose, tight.clone(), tight.clone(), tight]);
        let one: Vec<bool> = flags.iter().map(|f| f.contains(RuleId::TightRange1Day)).collect();
        let three: Vec<bool> = flags.iter().map(|f| f.contains(RuleId::TightRange3Day)).collect();
        assert_eq!(one, vec![true, true, false, true, true, true]);
        assert_eq!(three, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn volume_decline_uses_previous_average() {
        let first = IndicatorRow {
            volume_avg_21: Some(1000.0),
            ..row(100.0)
        };
        let second = IndicatorRow {
            volume: 700.0,
            volume_avg_21: Some(500.0),
            ..row(100.0)
        };
        let flags = eval(&[first, second]);
        assert!(!flags[0].contains(RuleId::VolumeDecline));
        assert!(flags[1].contains(RuleId::VolumeDecline));
    }

    #[test]
    fn low_vol_waits_for_history() {
        let rows: Vec<IndicatorRow> = (0..25)
            .map(|_| IndicatorRow {
                volatility_21d: Some(0.0),
                ..row(100.0)
            })
            .collect();
        let flags = eval(&rows);
        assert!(!flags[19].contains(RuleId::LowVol));
        assert!(flags[20].contains(RuleId::LowVol));
        assert!(flags[24].contains(RuleId::LowVol));
    }

    #[test]
    fn low_vol_against_history() {
        let mut rows: Vec<IndicatorRow> = (0..30)
            .map(|i| IndicatorRow {
                volatility_21d: Some(0.2 + i as f64 * 0.01),
                ..row(100.0)
            })
            .collect();
        rows.push(IndicatorRow {
            volatility_21d: Some(0.1),
            ..row(100.0)
        });
        let flags = eval(&rows);
        // Rising volatility is never in the bottom quintile.
        assert!(!flags[29].contains(RuleId::LowVol));
        assert!(flags[30].contains(RuleId::LowVol));
    }

    #[test]
    fn extended_and_distribution_rules() {
        let extended = IndicatorRow {
            overextension: Some(0.10),
            return_5d: Some(0.005),
            return_63d: Some(0.3),
            volume: 2000.0,
            volume_avg_63: Some(1000.0),
            ..row(100.0)
        };
        let flags = eval(&[extended])[0];
        assert!(flags.contains(RuleId::Overextended));
        assert!(flags.contains(RuleId::Divergence));
        assert!(flags.contains(RuleId::ClimaxVol));

        let weak = IndicatorRow {
            ma_21: Some(105.0),
            return_21d: Some(-0.02),
            ..row(100.0)
        };
        let flags = eval(&[weak])[0];
        assert!(flags.contains(RuleId::PriceBelowMa21));
        assert!(flags.contains(RuleId::MomentumDown));
    }

    #[test]
    fn vol_dryup() {
        let r = IndicatorRow {
            volume_ratio: Some(0.7),
            volume_avg_8: Some(700.0),
            volume_avg_63: Some(1000.0),
            ..row(100.0)
        };
        assert!(eval(&[r])[0].contains(RuleId::VolDryup));
    }
}
