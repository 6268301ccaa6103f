//! StageLab Core: indicators, rule evaluation, stage classification,
//! dynamic levels and the trade lifecycle.
//!
//! A security's bar series flows through a fixed pipeline:
//! - Indicator Engine (per-bar indicator rows, warmup as `None`)
//! - Rule Evaluator (boolean rule flags per row)
//! - Stage Classifier (full-match stages, forward-filled, close-to sets)
//! - Dynamic Level Calculator (ratcheted stop, 2:1 target)
//! - Trade Lifecycle (entry/hold/exit state per row)
//!
//! `pipeline::StagePipeline` runs all of them for one security and
//! `snapshot::assemble_snapshot` picks the reference-date row.

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod levels;
pub mod lifecycle;
pub mod pipeline;
pub mod rules;
pub mod snapshot;
pub mod stages;

pub use pipeline::{ClassifierConfig, SecurityTimeline, StagePipeline, TimelineRow};
pub use snapshot::{assemble_snapshot, SnapshotError, SnapshotRow};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the batch runner shares across
    /// worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::SecuritySeries>();
        require_sync::<domain::SecuritySeries>();
        require_send::<domain::SecurityMeta>();
        require_sync::<domain::SecurityMeta>();

        // Configuration
        require_send::<ClassifierConfig>();
        require_sync::<ClassifierConfig>();
        require_send::<stages::StageTable>();
        require_sync::<stages::StageTable>();
        require_send::<fingerprint::ConfigHash>();
        require_sync::<fingerprint::ConfigHash>();

        // Pipeline
        require_send::<StagePipeline>();
        require_sync::<StagePipeline>();
        require_send::<engine::IndicatorEngine>();
        require_sync::<engine::IndicatorEngine>();
        require_send::<SecurityTimeline>();
        require_sync::<SecurityTimeline>();
        require_send::<SnapshotRow>();
        require_sync::<SnapshotRow>();

        // Sources
        require_send::<data::InMemoryPrices>();
        require_sync::<data::InMemoryPrices>();
        require_send::<data::InMemoryMetadata>();
        require_sync::<data::InMemoryMetadata>();
    }

    /// Architecture contract: indicators see bars only, never rules or stages.
    #[test]
    fn indicator_trait_takes_bars_only() {
        fn _check_trait_object_builds(
            ind: &dyn indicators::Indicator,
            bars: &[domain::PriceBar],
        ) -> Vec<f64> {
            ind.compute(bars)
        }
    }
}
