//! Indicator Engine: turns a security's bar series into indicator rows.
//!
//! Indicators are computed column-at-a-time over the whole series
//! (each column only ever looks backward), then zipped into one
//! `IndicatorRow` per bar with warmup values surfaced as `None`.

pub mod diagnostics;
pub mod indicator_engine;
pub mod precompute;
pub mod row;

pub use diagnostics::Diagnostic;
pub use indicator_engine::{EngineOutput, IndicatorEngine};
pub use precompute::{compute_warmup, default_indicators, precompute_indicators};
pub use row::IndicatorRow;
