//! Snapshot Assembler: one exported row per security at the reference date.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{SecurityId, SecurityMeta};
use crate::lifecycle::TradeAction;
use crate::pipeline::{SecurityTimeline, TimelineRow};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("security '{security}' has no row dated {date}")]
    NoReferenceDateData { security: SecurityId, date: NaiveDate },

    #[error("security identifier is missing")]
    MissingIdentifier,
}

/// The exported row: identity, display fields and the full processed row.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRow {
    pub security_id: SecurityId,
    pub name: Option<String>,
    pub ticker: String,
    pub industry: Option<String>,
    pub reference_date: NaiveDate,
    #[serde(flatten)]
    pub row: TimelineRow,
    pub position_summary: String,
}

fn fmt_price(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}"))
}

fn fmt_pnl(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |p| format!("{p:+.1}%"))
}

/// Short human-readable description of the trade state on a row.
pub fn position_summary(row: &TimelineRow) -> String {
    let trade = &row.trade;
    match (trade.entry_price, trade.entry_date, trade.exit_price, trade.exit_date) {
        (Some(entry), Some(since), None, _) => format!(
            "Holding since {since} @ {entry:.2} ({}), stop {}, target {}",
            fmt_pnl(trade.pnl_pct),
            fmt_price(row.levels.stop_loss),
            fmt_price(row.levels.take_profit),
        ),
        (Some(_), _, Some(exit), Some(on)) => {
            format!("Exited {on} @ {exit:.2} ({})", fmt_pnl(trade.pnl_pct))
        }
        _ if trade.status.action == TradeAction::Exit => {
            format!("Exit signal: {}", row.stage.name())
        }
        _ if !row.close_to.is_empty() => {
            let names: Vec<&str> = row.close_to.iter().map(|s| s.name()).collect();
            format!("Watching: close to {}", names.join(", "))
        }
        _ => "No position".to_string(),
    }
}

/// Select the reference-date row of a processed security.
pub fn assemble_snapshot(
    timeline: &SecurityTimeline,
    meta: Option<&SecurityMeta>,
    reference_date: NaiveDate,
) -> Result<SnapshotRow, SnapshotError> {
    if timeline.security.is_blank() {
        return Err(SnapshotError::MissingIdentifier);
    }
    let row = timeline
        .row_at(reference_date)
        .ok_or_else(|| SnapshotError::NoReferenceDateData {
            security: timeline.security.clone(),
            date: reference_date,
        })?;

    let ticker = meta
        .and_then(|m| m.ticker())
        .map(str::to_string)
        .unwrap_or_else(|| timeline.security.to_string());

    Ok(SnapshotRow {
        security_id: timeline.security.clone(),
        name: meta.and_then(|m| m.name.clone()),
        ticker,
        industry: meta.and_then(|m| m.industry.clone()),
        reference_date,
        position_summary: position_summary(row),
        row: row.clone(),
    })
}
