//! Dynamic Level Calculator and the long-stop ratchet.

pub mod calculator;
pub mod ratchet;

pub use calculator::{LevelCalculator, RiskLevels};
pub use ratchet::RatchetState;
