//! Batch fingerprinting: deterministic hashes of the configuration and of
//! the input data a batch ran over.
//!
//! Both use blake3 over a canonical byte encoding and render as hex.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::SecuritySeries;

/// Hash of the canonical JSON of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Hash any serializable config. Struct fields serialize in declaration
    /// order and maps are BTreeMaps, so the JSON is stable.
    pub fn of<T: Serialize>(config: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(config)?;
        Ok(Self::from_bytes(&json))
    }

    /// First 12 hex characters, for logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of the loaded price data (ids, dates and OHLCV bits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of_series<'a>(series: impl IntoIterator<Item = &'a SecuritySeries>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for s in series {
            hasher.update(s.id.as_str().as_bytes());
            hasher.update(&[0]);
            for bar in s.bars() {
                hasher.update(bar.date.to_string().as_bytes());
                for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                    hasher.update(&v.to_bits().to_le_bytes());
                }
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Fold per-security hashes (in the given order) into one.
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a DatasetHash>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part.0.as_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
