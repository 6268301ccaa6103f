//! Per-security diagnostics recorded while the pipeline degrades instead of
//! failing.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An indicator routine panicked or returned a malformed column; the
    /// column was replaced by nulls.
    ComputationFailure { indicator: String, reason: String },
    /// Rows sharing a date were collapsed to the last occurrence.
    DuplicateDates { dropped: usize },
    /// Fewer bars than the configured minimum; the security was skipped.
    InsufficientBars { bars: usize, required: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ComputationFailure { indicator, reason } => {
                write!(f, "indicator '{indicator}' failed: {reason}")
            }
            Diagnostic::DuplicateDates { dropped } => {
                write!(f, "dropped {dropped} duplicate-date row(s)")
            }
            Diagnostic::InsufficientBars { bars, required } => {
                write!(f, "{bars} bar(s), at least {required} required")
            }
        }
    }
}
