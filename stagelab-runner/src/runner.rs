//! Batch runner: load each security's window, run the stage pipeline,
//! keep the reference-date row.
//!
//! One unit of work is one security's full history. Work fans out across
//! a rayon pool; per-security failures exclude that security and never
//! abort the batch. Structural input problems (schema errors) do.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use stagelab_core::data::{DataError, MetadataSource, PriceSource};
use stagelab_core::domain::SecurityId;
use stagelab_core::engine::Diagnostic;
use stagelab_core::fingerprint::DatasetHash;
use stagelab_core::{assemble_snapshot, SnapshotError, SnapshotRow, StagePipeline};

use crate::config::{BatchConfig, ConfigError};
use crate::report::{
    stage_distribution, BatchReport, ExcludedSecurity, ExclusionReason, Timing, SCHEMA_VERSION,
};

/// Errors that abort a whole batch.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result of processing one security.
#[derive(Debug)]
struct SecurityOutcome {
    id: SecurityId,
    result: Result<SnapshotRow, ExclusionReason>,
    diagnostics: Vec<Diagnostic>,
    dataset_hash: Option<DatasetHash>,
}

impl SecurityOutcome {
    fn excluded(id: &SecurityId, reason: ExclusionReason) -> Self {
        Self {
            id: id.clone(),
            result: Err(reason),
            diagnostics: Vec::new(),
            dataset_hash: None,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}

struct BatchContext<'a> {
    config: &'a BatchConfig,
    pipeline: StagePipeline,
    prices: &'a dyn PriceSource,
    meta: Option<&'a dyn MetadataSource>,
    reference: NaiveDate,
    start: NaiveDate,
}

impl BatchContext<'_> {
    fn process(&self, id: &SecurityId) -> Result<SecurityOutcome, RunError> {
        let series = match self.prices.history(id, self.start, self.reference) {
            Ok(series) => series,
            Err(e @ DataError::Schema(_)) => return Err(e.into()),
            Err(e) => {
                return Ok(SecurityOutcome::excluded(
                    id,
                    ExclusionReason::LoadFailed {
                        message: e.to_string(),
                    },
                ))
            }
        };

        let required = self.config.batch.min_bars;
        if series.len() < required {
            let mut outcome = SecurityOutcome::excluded(
                id,
                ExclusionReason::InsufficientBars {
                    bars: series.len(),
                    required,
                },
            );
            outcome.diagnostics.push(Diagnostic::InsufficientBars {
                bars: series.len(),
                required,
            });
            return Ok(outcome);
        }

        let dataset_hash = Some(DatasetHash::of_series([&series]));
        let timeline = match catch_unwind(AssertUnwindSafe(|| self.pipeline.process(&series))) {
            Ok(timeline) => timeline,
            Err(payload) => {
                let mut outcome = SecurityOutcome::excluded(
                    id,
                    ExclusionReason::ProcessingFailed {
                        message: panic_message(payload.as_ref()),
                    },
                );
                outcome.dataset_hash = dataset_hash;
                return Ok(outcome);
            }
        };

        let meta = self.meta.and_then(|m| m.metadata(id));
        let result = assemble_snapshot(&timeline, meta.as_ref(), self.reference).map_err(|e| match e {
            SnapshotError::NoReferenceDateData { date, .. } => {
                ExclusionReason::NoReferenceDateData { date }
            }
            SnapshotError::MissingIdentifier => ExclusionReason::MissingIdentifier,
        });
        Ok(SecurityOutcome {
            id: id.clone(),
            result,
            diagnostics: timeline.diagnostics,
            dataset_hash,
        })
    }
}

/// Run one batch over every security in `prices`.
///
/// `today` is the reference date when the config does not pin one.
pub fn run_batch(
    config: &BatchConfig,
    prices: &dyn PriceSource,
    meta: Option<&dyn MetadataSource>,
    today: NaiveDate,
) -> Result<BatchReport, RunError> {
    config.validate()?;
    let started = Instant::now();
    let reference = config.reference_date(today);
    let (start, _) = config.window(reference)?;
    let config_hash = config.config_hash()?;

    let mut ids = prices.security_ids()?;
    ids.sort();
    ids.dedup();

    let _span = info_span!(
        "batch",
        reference = %reference,
        config = config_hash.short(),
        securities = ids.len()
    )
    .entered();
    info!(source = prices.name(), start = %start, "starting batch");

    let ctx = BatchContext {
        config,
        pipeline: StagePipeline::new(&config.classifier()),
        prices,
        meta,
        reference,
        start,
    };

    let outcomes: Vec<SecurityOutcome> = if config.batch.parallel {
        let work = || {
            ids.par_iter()
                .map(|id| ctx.process(id))
                .collect::<Result<Vec<_>, _>>()
        };
        match config.batch.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(work)?,
            None => work()?,
        }
    } else {
        ids.iter()
            .map(|id| ctx.process(id))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut snapshots = Vec::new();
    let mut excluded = Vec::new();
    let mut diagnostics = BTreeMap::new();
    let mut hashes = Vec::new();
    for outcome in outcomes {
        if !outcome.diagnostics.is_empty() {
            debug!(id = %outcome.id, count = outcome.diagnostics.len(), "diagnostics recorded");
            diagnostics.insert(outcome.id.clone(), outcome.diagnostics);
        }
        hashes.extend(outcome.dataset_hash);
        match outcome.result {
            Ok(row) => snapshots.push(row),
            Err(reason) => {
                warn!(id = %outcome.id, ?reason, "security excluded from snapshot");
                excluded.push(ExcludedSecurity {
                    security_id: outcome.id,
                    reason,
                });
            }
        }
    }
    snapshots.sort_by(|a, b| a.security_id.cmp(&b.security_id));
    excluded.sort_by(|a, b| a.security_id.cmp(&b.security_id));

    let report = BatchReport {
        schema_version: SCHEMA_VERSION,
        reference_date: reference,
        config_hash,
        dataset_hash: DatasetHash::combine(&hashes),
        source: prices.name().to_string(),
        universe: ids.len(),
        stage_distribution: stage_distribution(&snapshots),
        snapshots,
        excluded,
        diagnostics,
        timing: Timing::new(started.elapsed(), ids.len()),
    };
    info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagelab_core::data::InMemoryPrices;
    use stagelab_core::domain::{PriceBar, SecuritySeries};

    fn bars(n: usize, start: NaiveDate) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2).sin() * 3.0;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn source() -> InMemoryPrices {
        let start = d(2024, 1, 1);
        InMemoryPrices::from_series(
            "mem",
            [
                SecuritySeries::new("B".into(), bars(60, start)),
                SecuritySeries::new("A".into(), bars(60, start)),
                // Ends before the reference date.
                SecuritySeries::new("C".into(), bars(20, start)),
            ],
        )
    }

    fn config(parallel: bool) -> BatchConfig {
        let mut config = BatchConfig::default();
        config.batch.reference_date = Some(d(2024, 2, 15));
        config.batch.parallel = parallel;
        config
    }

    #[test]
    fn snapshot_and_exclusions() {
        let report = run_batch(&config(false), &source(), None, d(2030, 1, 1)).unwrap();
        assert_eq!(report.universe, 3);
        let ids: Vec<&str> = report.snapshots.iter().map(|s| s.security_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(
            report.excluded_reason("C"),
            Some(&ExclusionReason::NoReferenceDateData { date: d(2024, 2, 15) })
        );
        assert_eq!(report.stage_distribution.values().sum::<usize>(), 2);
        assert_eq!(report.reference_date, d(2024, 2, 15));
    }

    #[test]
    fn parallel_matches_sequential() {
        let seq = run_batch(&config(false), &source(), None, d(2030, 1, 1)).unwrap();
        let mut cfg = config(true);
        cfg.batch.threads = Some(2);
        let par = run_batch(&cfg, &source(), None, d(2030, 1, 1)).unwrap();
        assert_eq!(
            serde_json::to_value(&seq.snapshots).unwrap(),
            serde_json::to_value(&par.snapshots).unwrap()
        );
        assert_eq!(seq.dataset_hash, par.dataset_hash);
        assert_eq!(seq.config_hash, par.config_hash);
    }

    #[test]
    fn min_bars_skips_short_histories() {
        let mut cfg = config(false);
        cfg.batch.min_bars = 50;
        let report = run_batch(&cfg, &source(), None, d(2030, 1, 1)).unwrap();
        assert_eq!(
            report.excluded_reason("C"),
            Some(&ExclusionReason::InsufficientBars { bars: 20, required: 50 })
        );
        assert_eq!(
            report.diagnostics.get(&SecurityId::from("C")),
            Some(&vec![Diagnostic::InsufficientBars { bars: 20, required: 50 }])
        );
    }

    #[test]
    fn lookback_past_earliest_date_is_a_config_error() {
        let mut cfg = config(false);
        cfg.batch.reference_date = Some(NaiveDate::MIN);
        let result = run_batch(&cfg, &source(), None, d(2030, 1, 1));
        assert!(matches!(result, Err(RunError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn reference_date_defaults_to_today() {
        let mut cfg = config(false);
        cfg.batch.reference_date = None;
        let report = run_batch(&cfg, &source(), None, d(2024, 1, 10)).unwrap();
        assert_eq!(report.reference_date, d(2024, 1, 10));
        assert_eq!(report.snapshots.len(), 3);
    }

    #[test]
    fn lookback_limits_history() {
        let mut cfg = config(false);
        cfg.batch.lookback_days = 10;
        let report = run_batch(&cfg, &source(), None, d(2030, 1, 1)).unwrap();
        let a = report.snapshot("A").unwrap();
        // 11 bars in the inclusive window: short returns exist, 21-day ones do not.
        assert!(a.row.indicators.return_5d.is_some());
        assert!(a.row.indicators.return_21d.is_none());
        assert!(a.row.indicators.ma_21.is_none());
    }
}
