//! Batch configuration loaded from TOML.
//!
//! Every section is optional; an empty file yields the default batch.
//!
//! ```toml
//! [batch]
//! reference_date = "2024-06-28"
//! lookback_days = 730
//! parallel = true
//! threads = 8
//! min_bars = 1
//!
//! [rules]
//! overextended = 0.08
//!
//! [stages]
//! scenario = "strict"
//! tie_break = "highest_stage"
//!
//! [stages.overrides.SUSTAINED]
//! optimal_days = 30
//! ```

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stagelab_core::fingerprint::ConfigHash;
use stagelab_core::rules::RuleThresholds;
use stagelab_core::stages::StageSettings;
use stagelab_core::ClassifierConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to hash config: {0}")]
    Hash(#[from] serde_json::Error),
}

/// `[batch]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Snapshot date; today when absent.
    pub reference_date: Option<NaiveDate>,
    /// Calendar days of history loaded up to the reference date.
    pub lookback_days: u32,
    pub parallel: bool,
    /// Size of a dedicated worker pool; rayon's global pool when absent.
    pub threads: Option<usize>,
    /// Securities with fewer bars are skipped.
    pub min_bars: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            reference_date: None,
            lookback_days: 730,
            parallel: true,
            threads: None,
            min_bars: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch: BatchSettings,
    pub rules: RuleThresholds,
    pub stages: StageSettings,
}

/// The part of the configuration that changes results.
#[derive(Serialize)]
struct HashedConfig<'a> {
    lookback_days: u32,
    min_bars: usize,
    rules: &'a RuleThresholds,
    stages: &'a StageSettings,
}

impl BatchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be > 0".into()));
        }
        if self.batch.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be > 0".into()));
        }
        let q = self.rules.low_vol_quantile;
        if !(0.0..=1.0).contains(&q) {
            return Err(ConfigError::Invalid(format!(
                "low_vol_quantile must be within [0, 1], got {q}"
            )));
        }
        for (stage, o) in &self.stages.overrides {
            if let (Some(min), Some(max)) = (o.min_return_pct, o.max_return_pct) {
                if min > max {
                    return Err(ConfigError::Invalid(format!(
                        "{stage}: min_return_pct {min} exceeds max_return_pct {max}"
                    )));
                }
            }
            if o.base_stop_pct.is_some_and(|p| p <= 0.0) {
                return Err(ConfigError::Invalid(format!("{stage}: base_stop_pct must be > 0")));
            }
        }
        Ok(())
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            rules: self.rules.clone(),
            stages: self.stages.clone(),
        }
    }

    /// Configured reference date, or `today`.
    pub fn reference_date(&self, today: NaiveDate) -> NaiveDate {
        self.batch.reference_date.unwrap_or(today)
    }

    /// Inclusive load window ending at `reference`.
    pub fn window(&self, reference: NaiveDate) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let lookback = Duration::days(i64::from(self.batch.lookback_days));
        let start = reference.checked_sub_signed(lookback).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "lookback_days {} reaches before the earliest date from {reference}",
                self.batch.lookback_days
            ))
        })?;
        Ok((start, reference))
    }

    /// Hash of everything that affects results. Parallelism settings and
    /// the reference date are excluded.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        Ok(ConfigHash::of(&HashedConfig {
            lookback_days: self.batch.lookback_days,
            min_bars: self.batch.min_bars,
            rules: &self.rules,
            stages: &self.stages,
        })?)
    }
}
