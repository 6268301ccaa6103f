//! StageLab Runner: batch orchestration over a universe of securities.
//!
//! This crate builds on `stagelab-core` to provide:
//! - TOML batch configuration and its result-affecting hash
//! - CSV and Parquet price sources, CSV metadata source
//! - Parallel per-security pipeline with fail-soft exclusions
//! - Batch report (JSON) and snapshot table (CSV) export
//! - Seeded synthetic universes

pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;
pub mod runner;
pub mod synthetic;

pub use config::{BatchConfig, BatchSettings, ConfigError};
pub use data_loader::{open_price_source, CsvMetadataSource, CsvPriceSource, ParquetPriceSource};
pub use export::{export_json, export_snapshot_csv, save_report};
pub use report::{BatchReport, ExcludedSecurity, ExclusionReason, Timing};
pub use runner::{run_batch, RunError};
pub use synthetic::{generate_universe, write_prices_csv, SyntheticConfig};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
        assert_send::<SyntheticConfig>();
        assert_sync::<SyntheticConfig>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<CsvPriceSource>();
        assert_sync::<CsvPriceSource>();
        assert_send::<ParquetPriceSource>();
        assert_sync::<ParquetPriceSource>();
        assert_send::<CsvMetadataSource>();
        assert_sync::<CsvMetadataSource>();
    }

    #[test]
    fn batch_report_is_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
    }
}
