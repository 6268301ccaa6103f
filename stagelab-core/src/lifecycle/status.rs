//! Trade actions and their human-readable status labels.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    NoAction,
    Entry,
    Hold,
    Exit,
}

impl TradeAction {
    pub fn label(&self) -> &'static str {
        match self {
            TradeAction::NoAction => "NO_ACTION",
            TradeAction::Entry => "ENTRY",
            TradeAction::Hold => "HOLD",
            TradeAction::Exit => "EXIT",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an EXIT fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopHit,
    Distribution,
    EarlyTopping,
    MaxTarget,
    OptimalDays,
}

/// Action plus the stage it happened in, e.g. `HOLD - Stage 3 (SUSTAINED)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeStatus {
    pub action: TradeAction,
    pub stage: Stage,
}

impl TradeStatus {
    pub fn new(action: TradeAction, stage: Stage) -> Self {
        Self { action, stage }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.action, self.stage)
    }
}

impl Serialize for TradeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_format() {
        let status = TradeStatus::new(TradeAction::Hold, Stage::Sustained);
        assert_eq!(status.to_string(), "HOLD - Stage 3 (SUSTAINED)");
        let status = TradeStatus::new(TradeAction::NoAction, Stage::Setup);
        assert_eq!(status.to_string(), "NO_ACTION - Stage 0 (SETUP)");
    }

    #[test]
    fn status_serializes_as_label() {
        let status = TradeStatus::new(TradeAction::Exit, Stage::Distribution);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#""EXIT - Stage 5 (DISTRIBUTION)""#
        );
    }
}
