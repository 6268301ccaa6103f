//! Composite risk score (0–100, higher is safer) and its category.
//!
//! Each component is oriented so that larger means riskier, ranked against
//! its own history up to the row, and turned into a safety score
//! `100 - rank`. The score is the weighted mean of the safety scores that
//! are defined on the row, normalised by their weights.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::expanding::expanding_percentile_rank;

/// Score components in weight order.
pub const RISK_WEIGHTS: [(RiskComponent, f64); 6] = [
    (RiskComponent::Volatility, 20.0),
    (RiskComponent::Drawdown, 20.0),
    (RiskComponent::ValueAtRisk, 20.0),
    (RiskComponent::Sharpe, 15.0),
    (RiskComponent::VolumeCv, 15.0),
    (RiskComponent::PriceCv, 10.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskComponent {
    Volatility,
    Drawdown,
    ValueAtRisk,
    Sharpe,
    VolumeCv,
    PriceCv,
}

impl RiskComponent {
    /// Column the component is read from.
    pub fn column(&self) -> &'static str {
        match self {
            RiskComponent::Volatility => "volatility_21d",
            RiskComponent::Drawdown => "max_drawdown_252d",
            RiskComponent::ValueAtRisk => "var_1d",
            RiskComponent::Sharpe => "sharpe_ratio",
            RiskComponent::VolumeCv => "volume_cv",
            RiskComponent::PriceCv => "price_cv",
        }
    }

    /// Map a raw value to "larger is riskier".
    fn orient(&self, v: f64) -> f64 {
        match self {
            RiskComponent::Drawdown | RiskComponent::ValueAtRisk => v.abs(),
            RiskComponent::Sharpe => -v,
            _ => v,
        }
    }
}

/// Compute the risk score column. `column` looks up a component's raw values.
pub fn risk_scores<'a>(len: usize, column: impl Fn(&str) -> &'a [f64]) -> Vec<f64> {
    let mut weighted = vec![0.0; len];
    let mut weights = vec![0.0; len];

    for (component, weight) in RISK_WEIGHTS {
        let raw = column(component.column());
        let oriented: Vec<f64> = raw.iter().map(|&v| component.orient(v)).collect();
        let ranks = expanding_percentile_rank(&oriented);
        for (i, rank) in ranks.iter().enumerate().take(len) {
            if rank.is_finite() {
                weighted[i] += weight * (100.0 - rank);
                weights[i] += weight;
            }
        }
    }

    weighted
        .iter()
        .zip(&weights)
        .map(|(&w, &total)| {
            if total > 0.0 {
                (w / total).clamp(0.0, 100.0)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Five 20-point bins over the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl RiskCategory {
    pub fn from_score(score: f64) -> Option<Self> {
        if !score.is_finite() {
            return None;
        }
        Some(match score {
            s if s < 20.0 => RiskCategory::VeryHigh,
            s if s < 40.0 => RiskCategory::High,
            s if s < 60.0 => RiskCategory::Moderate,
            s if s < 80.0 => RiskCategory::Low,
            _ => RiskCategory::VeryLow,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::VeryHigh => "Very High",
            RiskCategory::High => "High",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::Low => "Low",
            RiskCategory::VeryLow => "Very Low",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
