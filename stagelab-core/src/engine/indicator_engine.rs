//! Indicator Engine: bar series in, `IndicatorRow` series out.

use tracing::debug;

use crate::domain::PriceBar;
use crate::engine::diagnostics::Diagnostic;
use crate::engine::precompute::{default_indicators, precompute_indicators};
use crate::engine::row::IndicatorRow;
use crate::indicators::flow::{absorption, accumulation_days, block_trades, smart_money};
use crate::indicators::risk_score::risk_scores;
use crate::indicators::rolling::ratio;
use crate::indicators::{close_column, Indicator, IndicatorValues, RiskCategory};

const RANGE_EPSILON: f64 = 1e-9;

/// Output of one engine pass over a security.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub rows: Vec<IndicatorRow>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the full feature set for one security at a time.
///
/// Holds no per-security state, so one engine is shared by every worker.
pub struct IndicatorEngine {
    indicators: Vec<Box<dyn Indicator>>,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self {
            indicators: default_indicators(),
        }
    }

    /// Engine over a custom indicator set. Missing columns read as null.
    pub fn with_indicators(indicators: Vec<Box<dyn Indicator>>) -> Self {
        Self { indicators }
    }

    pub fn indicators(&self) -> &[Box<dyn Indicator>] {
        &self.indicators
    }

    pub fn compute(&self, bars: &[PriceBar]) -> EngineOutput {
        let (mut values, diagnostics) = precompute_indicators(bars, &self.indicators);
        add_derived_columns(bars, &mut values);
        let rows = assemble_rows(bars, &values);
        debug!(bars = bars.len(), columns = values.len(), "indicators computed");
        EngineOutput { rows, diagnostics }
    }
}

fn add_derived_columns(bars: &[PriceBar], values: &mut IndicatorValues) {
    let n = bars.len();

    values.insert(
        "volume_ratio",
        ratio(&values.column("volume_avg_8"), &values.column("volume_avg_21")),
    );

    let range = |hi: Vec<f64>, lo: Vec<f64>| -> Vec<f64> {
        hi.iter().zip(&lo).map(|(h, l)| h - l).collect()
    };
    let range_5d = range(values.column("high_5d"), values.column("low_5d"));
    let range_21d = range(values.column("high_21d"), values.column("low_21d"));
    let floored: Vec<f64> = range_21d
        .iter()
        .map(|&r| if r.is_finite() { r.max(RANGE_EPSILON) } else { f64::NAN })
        .collect();
    values.insert("range_contraction", ratio(&range_5d, &floored));
    values.insert("range_5d", range_5d);
    values.insert("range_21d", range_21d);

    let closes = close_column(bars);
    let overextension: Vec<f64> = ratio(&closes, &values.column("ma_21"))
        .iter()
        .map(|r| r - 1.0)
        .collect();
    values.insert("overextension", overextension);

    let nan = vec![f64::NAN; n];
    let score = risk_scores(n, |name| values.get_series(name).unwrap_or(&nan));
    values.insert("risk_score", score);
}

struct FlowFlags {
    accumulation: Vec<bool>,
    absorption: Vec<bool>,
    block_trade: Vec<bool>,
    smart_money: Vec<bool>,
}

fn flow_flags(bars: &[PriceBar], values: &IndicatorValues) -> FlowFlags {
    let avg_21 = values.column("volume_avg_21");
    let avg_63 = values.column("volume_avg_63");
    let accumulation = accumulation_days(bars, &avg_21, &values.column("ma_50"));
    let block_trade = block_trades(bars, &avg_63);
    let smart = smart_money(bars, &accumulation, &block_trade);
    FlowFlags {
        absorption: absorption(bars, &avg_21),
        accumulation,
        block_trade,
        smart_money: smart,
    }
}

fn assemble_rows(bars: &[PriceBar], values: &IndicatorValues) -> Vec<IndicatorRow> {
    let flags = flow_flags(bars, values);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let v = |name: &str| values.get(name, i);
            let risk_score = v("risk_score");
            IndicatorRow {
                return_1d: v("return_1d"),
                return_5d: v("return_5d"),
                return_21d: v("return_21d"),
                return_63d: v("return_63d"),
                ma_5: v("ma_5"),
                ma_21: v("ma_21"),
                ma_50: v("ma_50"),
                ma_63: v("ma_63"),
                ma_126: v("ma_126"),
                ma_252: v("ma_252"),
                atr: v("atr"),
                rsi: v("rsi"),
                adx: v("adx"),
                high_5d: v("high_5d"),
                low_5d: v("low_5d"),
                low_10d: v("low_10d"),
                high_21d: v("high_21d"),
                low_21d: v("low_21d"),
                range_5d: v("range_5d"),
                range_21d: v("range_21d"),
                range_contraction: v("range_contraction"),
                volume_avg_8: v("volume_avg_8"),
                volume_avg_21: v("volume_avg_21"),
                volume_avg_63: v("volume_avg_63"),
                volume_ratio: v("volume_ratio"),
                volume_delta: v("volume_delta"),
                volatility_5d: v("volatility_5d"),
                volatility_21d: v("volatility_21d"),
                drawdown: v("drawdown"),
                overextension: v("overextension"),
                accumulation_day: flags.accumulation[i],
                absorption: flags.absorption[i],
                block_trade: flags.block_trade[i],
                smart_money: flags.smart_money[i],
                var_1d: v("var_1d"),
                sharpe_ratio: v("sharpe_ratio"),
                max_drawdown_252d: v("max_drawdown_252d"),
                kelly_fraction: v("kelly_fraction"),
                volume_cv: v("volume_cv"),
                price_cv: v("price_cv"),
                risk_score,
                risk_category: risk_score.and_then(RiskCategory::from_score),
                ..IndicatorRow::from_bar(bar)
            }
        })
        .collect()
}
