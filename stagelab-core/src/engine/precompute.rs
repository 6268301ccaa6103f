//! Indicator precomputation.
//!
//! All indicators are computed once per security before rules are
//! evaluated. A failing indicator is isolated: its column becomes all-NaN
//! and a diagnostic is recorded, the rest of the series is unaffected.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::domain::PriceBar;
use crate::engine::diagnostics::Diagnostic;
use crate::indicators::{
    Adx, Atr, Channel, CoefficientOfVariation, CvSource, Indicator, IndicatorValues,
    KellyFraction, Returns, Rsi, SharpeRatio, Sma, TrailingDrawdown, ValueAtRisk, Volatility,
    VolumeAverage, VolumeDelta,
};

pub const RETURN_PERIODS: [usize; 4] = [1, 5, 21, 63];
pub const MA_PERIODS: [usize; 6] = [5, 21, 50, 63, 126, 252];
pub const VOLUME_AVG_PERIODS: [usize; 3] = [8, 21, 63];
pub const OSCILLATOR_PERIOD: usize = 14;
pub const RISK_WINDOW: usize = 21;

/// The fixed indicator set every security is processed with.
pub fn default_indicators() -> Vec<Box<dyn Indicator>> {
    let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();
    for p in RETURN_PERIODS {
        indicators.push(Box::new(Returns::new(p)));
    }
    for p in MA_PERIODS {
        indicators.push(Box::new(Sma::new(p)));
    }
    indicators.push(Box::new(Atr::new(OSCILLATOR_PERIOD)));
    indicators.push(Box::new(Rsi::new(OSCILLATOR_PERIOD)));
    indicators.push(Box::new(Adx::new(OSCILLATOR_PERIOD)));
    for p in [5, 21] {
        indicators.push(Box::new(Channel::upper(p)));
        indicators.push(Box::new(Channel::lower(p)));
    }
    indicators.push(Box::new(Channel::lower(10)));
    for p in VOLUME_AVG_PERIODS {
        indicators.push(Box::new(VolumeAverage::new(p)));
    }
    indicators.push(Box::new(VolumeDelta::new(5)));
    indicators.push(Box::new(Volatility::new(5)));
    indicators.push(Box::new(Volatility::new(RISK_WINDOW)));
    indicators.push(Box::new(TrailingDrawdown::quarter()));
    indicators.push(Box::new(TrailingDrawdown::year()));
    indicators.push(Box::new(ValueAtRisk::new(RISK_WINDOW)));
    indicators.push(Box::new(SharpeRatio::new(RISK_WINDOW)));
    indicators.push(Box::new(KellyFraction));
    indicators.push(Box::new(CoefficientOfVariation::new(CvSource::Volume, RISK_WINDOW)));
    indicators.push(Box::new(CoefficientOfVariation::new(CvSource::Close, RISK_WINDOW)));
    indicators
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

/// Precompute every indicator over one security's bars.
pub fn precompute_indicators(
    bars: &[PriceBar],
    indicators: &[Box<dyn Indicator>],
) -> (IndicatorValues, Vec<Diagnostic>) {
    let mut values = IndicatorValues::with_len(bars.len());
    let mut diagnostics = Vec::new();

    for indicator in indicators {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| indicator.compute(bars)));
        let failure = match outcome {
            Ok(series) if series.len() == bars.len() => {
                values.insert(indicator.name(), series);
                continue;
            }
            Ok(series) => format!(
                "produced {} values for {} bars",
                series.len(),
                bars.len()
            ),
            Err(payload) => panic_message(payload.as_ref()),
        };
        warn!(indicator = indicator.name(), reason = %failure, "indicator degraded to null");
        values.insert(indicator.name(), vec![f64::NAN; bars.len()]);
        diagnostics.push(Diagnostic::ComputationFailure {
            indicator: indicator.name().to_string(),
            reason: failure,
        });
    }

    (values, diagnostics)
}

/// Bars needed before every indicator can produce a value.
pub fn compute_warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}
