//! Batch report: everything one run produced, serialized as JSON.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use stagelab_core::domain::{SecurityId, Stage};
use stagelab_core::engine::Diagnostic;
use stagelab_core::fingerprint::{ConfigHash, DatasetHash};
use stagelab_core::SnapshotRow;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Why a security has no snapshot row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason")]
pub enum ExclusionReason {
    NoReferenceDateData { date: NaiveDate },
    InsufficientBars { bars: usize, required: usize },
    MissingIdentifier,
    LoadFailed { message: String },
    ProcessingFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedSecurity {
    pub security_id: SecurityId,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timing {
    pub elapsed_ms: u64,
    pub securities_per_sec: f64,
}

impl Timing {
    pub fn new(elapsed: std::time::Duration, securities: usize) -> Self {
        let secs = elapsed.as_secs_f64();
        Self {
            elapsed_ms: elapsed.as_millis() as u64,
            securities_per_sec: if secs > 0.0 { securities as f64 / secs } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub schema_version: u32,
    pub reference_date: NaiveDate,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub source: String,
    pub universe: usize,
    pub snapshots: Vec<SnapshotRow>,
    pub excluded: Vec<ExcludedSecurity>,
    /// Non-fatal findings, keyed by security; securities without any are omitted.
    pub diagnostics: BTreeMap<SecurityId, Vec<Diagnostic>>,
    /// Snapshot rows per stage, every stage present.
    pub stage_distribution: BTreeMap<Stage, usize>,
    pub timing: Timing,
}

/// Snapshot-row count per stage.
pub fn stage_distribution(snapshots: &[SnapshotRow]) -> BTreeMap<Stage, usize> {
    let mut counts: BTreeMap<Stage, usize> = Stage::ALL.iter().map(|&s| (s, 0)).collect();
    for snap in snapshots {
        *counts.entry(snap.row.stage).or_default() += 1;
    }
    counts
}

impl BatchReport {
    /// Snapshot row of one security, if it was included.
    pub fn snapshot(&self, id: &str) -> Option<&SnapshotRow> {
        self.snapshots.iter().find(|s| s.security_id.as_str() == id)
    }

    pub fn excluded_reason(&self, id: &str) -> Option<&ExclusionReason> {
        self.excluded
            .iter()
            .find(|e| e.security_id.as_str() == id)
            .map(|e| &e.reason)
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        let stages: Vec<String> = self
            .stage_distribution
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(s, n)| format!("{}={n}", s.name()))
            .collect();
        format!(
            "{}: {} of {} securities in snapshot, {} excluded [{}] in {} ms",
            self.reference_date,
            self.snapshots.len(),
            self.universe,
            self.excluded.len(),
            stages.join(" "),
            self.timing.elapsed_ms,
        )
    }
}
