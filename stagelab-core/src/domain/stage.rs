//! Momentum stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six momentum-lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Setup,
    Breakout,
    EarlyMom,
    Sustained,
    Extended,
    Distribution,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Setup,
        Stage::Breakout,
        Stage::EarlyMom,
        Stage::Sustained,
        Stage::Extended,
        Stage::Distribution,
    ];

    /// Process baseline used for rows before the first full match.
    pub const BASELINE: Stage = Stage::Setup;

    pub fn id(self) -> u8 {
        match self {
            Stage::Setup => 0,
            Stage::Breakout => 1,
            Stage::EarlyMom => 2,
            Stage::Sustained => 3,
            Stage::Extended => 4,
            Stage::Distribution => 5,
        }
    }

    pub fn from_id(id: u8) -> Option<Stage> {
        Stage::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Setup => "SETUP",
            Stage::Breakout => "BREAKOUT",
            Stage::EarlyMom => "EARLY_MOM",
            Stage::Sustained => "SUSTAINED",
            Stage::Extended => "EXTENDED",
            Stage::Distribution => "DISTRIBUTION",
        }
    }

    /// Stages in which a new long position may be opened.
    pub fn allows_entry(self) -> bool {
        self.id() <= 3
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {} ({})", self.id(), self.name())
    }
}
