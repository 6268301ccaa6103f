//! Report export: pretty JSON for the full report, CSV for the snapshot
//! table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use stagelab_core::SnapshotRow;

use crate::report::BatchReport;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_default()
}

/// One line per snapshot row with the fields a watch-list needs.
///
/// Columns: security_id, ticker, name, industry, date, close, stage,
/// stage_age, days_remaining, close_to, stop_loss, take_profit,
/// risk_score, risk_category, status, position_summary
pub fn export_snapshot_csv(snapshots: &[SnapshotRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "security_id",
        "ticker",
        "name",
        "industry",
        "date",
        "close",
        "stage",
        "stage_age",
        "days_remaining",
        "close_to",
        "stop_loss",
        "take_profit",
        "risk_score",
        "risk_category",
        "status",
        "position_summary",
    ])?;

    for s in snapshots {
        let row = &s.row;
        let close_to: Vec<&str> = row.close_to.iter().map(|st| st.name()).collect();
        wtr.write_record([
            s.security_id.as_str(),
            &s.ticker,
            s.name.as_deref().unwrap_or(""),
            s.industry.as_deref().unwrap_or(""),
            &s.reference_date.to_string(),
            &format!("{:.2}", row.indicators.close),
            row.stage.name(),
            &row.run.stage_age.to_string(),
            &row.run.days_remaining.to_string(),
            &close_to.join("|"),
            &opt(row.levels.stop_loss, 2),
            &opt(row.levels.take_profit, 2),
            &opt(row.indicators.risk_score, 1),
            row.indicators.risk_category.map(|c| c.label()).unwrap_or(""),
            &row.trade.status.to_string(),
            &s.position_summary,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json` and `snapshot.csv` into `output_dir` (created if
/// needed). Returns the two paths.
pub fn save_report(report: &BatchReport, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let json_path = output_dir.join("report.json");
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let csv_path = output_dir.join("snapshot.csv");
    std::fs::write(&csv_path, export_snapshot_csv(&report.snapshots)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    Ok((json_path, csv_path))
}
