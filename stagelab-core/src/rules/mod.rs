//! Rule Evaluator: boolean rule conditions over indicator rows.

pub mod evaluator;
pub mod flags;
pub mod thresholds;

pub use evaluator::RuleEvaluator;
pub use flags::{RuleFlags, RuleId};
pub use thresholds::RuleThresholds;
