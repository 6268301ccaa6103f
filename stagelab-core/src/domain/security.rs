//! Security identity, reference metadata and the per-security bar series.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bar::PriceBar;

/// Stable identifier of a security in the reference-data store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecurityId(pub String);

impl SecurityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Display fields for a security, as provided by the metadata source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMeta {
    pub name: Option<String>,
    pub nse_code: Option<String>,
    pub bse_code: Option<String>,
    pub industry: Option<String>,
}

impl SecurityMeta {
    /// Preferred exchange code: NSE first, then BSE.
    pub fn ticker(&self) -> Option<&str> {
        non_blank(self.nse_code.as_deref()).or_else(|| non_blank(self.bse_code.as_deref()))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Ordered bar history of one security, the unit of processing.
///
/// Dates are strictly increasing. Construction sorts the input and keeps the
/// last bar for any duplicated date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySeries {
    pub id: SecurityId,
    bars: Vec<PriceBar>,
    duplicates_dropped: usize,
}

impl SecuritySeries {
    pub fn new(id: SecurityId, mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps input order among equal dates, so the later
        // occurrence of a duplicated date wins below.
        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(before);
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        let duplicates_dropped = before - deduped.len();
        Self {
            id,
            bars: deduped,
            duplicates_dropped,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Number of duplicate-date rows discarded at construction.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    pub fn first_date(&self) -> Option<chrono::NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<chrono::NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
