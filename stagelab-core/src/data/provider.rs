//! Data source traits and structured error types.
//!
//! The traits abstract over where price history and reference data come
//! from (CSV, Parquet, in-memory) so the runner can swap implementations and
//! tests can use fixtures.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::schema::SchemaError;
use crate::domain::{PriceBar, SecurityId, SecurityMeta, SecuritySeries};

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("invalid row {row} in {source_name}: {reason}")]
    InvalidRow {
        source_name: String,
        row: usize,
        reason: String,
    },

    #[error("security not found: {security}")]
    SecurityNotFound { security: SecurityId },
}

/// Source of daily bar history.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Every security the source can serve, sorted.
    fn security_ids(&self) -> Result<Vec<SecurityId>, DataError>;

    /// Bars of `security` dated within `[start, end]`, ordered by date.
    fn history(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecuritySeries, DataError>;
}

/// Source of display/reference fields.
pub trait MetadataSource: Send + Sync {
    fn metadata(&self, security: &SecurityId) -> Option<SecurityMeta>;
}

/// Price history held in memory, already grouped by security.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPrices {
    name: String,
    series: BTreeMap<SecurityId, Vec<PriceBar>>,
}

impl InMemoryPrices {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, series: SecuritySeries) {
        self.series.insert(series.id.clone(), series.bars().to_vec());
    }

    pub fn from_series(name: impl Into<String>, all: impl IntoIterator<Item = SecuritySeries>) -> Self {
        let mut source = Self::new(name);
        for series in all {
            source.insert(series);
        }
        source
    }
}

impl PriceSource for InMemoryPrices {
    fn name(&self) -> &str {
        &self.name
    }

    fn security_ids(&self) -> Result<Vec<SecurityId>, DataError> {
        Ok(self.series.keys().cloned().collect())
    }

    fn history(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecuritySeries, DataError> {
        let bars = self
            .series
            .get(security)
            .ok_or_else(|| DataError::SecurityNotFound {
                security: security.clone(),
            })?;
        let window = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Ok(SecuritySeries::new(security.clone(), window))
    }
}

/// Metadata keyed by security id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entries: HashMap<SecurityId, SecurityMeta>,
}

impl InMemoryMetadata {
    pub fn insert(&mut self, id: SecurityId, meta: SecurityMeta) {
        self.entries.insert(id, meta);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SecurityId, SecurityMeta)> for InMemoryMetadata {
    fn from_iter<I: IntoIterator<Item = (SecurityId, SecurityMeta)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl MetadataSource for InMemoryMetadata {
    fn metadata(&self, security: &SecurityId) -> Option<SecurityMeta> {
        self.entries.get(security).cloned()
    }
}
