//! Named rule conditions and the per-row flag set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Every rule condition the evaluator knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    LowVol,
    #[serde(rename = "TIGHT_RANGE_1DAY")]
    TightRange1Day,
    #[serde(rename = "TIGHT_RANGE_3DAY")]
    TightRange3Day,
    VolDryup,
    PriceBreakout,
    VolConfirm,
    Momentum,
    AboveMa21,
    MaCross,
    RelStrength,
    AboveMa126,
    MaStack,
    StrongMom,
    LowDrawdown,
    Overextended,
    Divergence,
    ClimaxVol,
    PriceBelowMa21,
    VolumeDecline,
    MomentumDown,
}

impl RuleId {
    pub const ALL: [RuleId; 20] = [
        RuleId::LowVol,
        RuleId::TightRange1Day,
        RuleId::TightRange3Day,
        RuleId::VolDryup,
        RuleId::PriceBreakout,
        RuleId::VolConfirm,
        RuleId::Momentum,
        RuleId::AboveMa21,
        RuleId::MaCross,
        RuleId::RelStrength,
        RuleId::AboveMa126,
        RuleId::MaStack,
        RuleId::StrongMom,
        RuleId::LowDrawdown,
        RuleId::Overextended,
        RuleId::Divergence,
        RuleId::ClimaxVol,
        RuleId::PriceBelowMa21,
        RuleId::VolumeDecline,
        RuleId::MomentumDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::LowVol => "LOW_VOL",
            RuleId::TightRange1Day => "TIGHT_RANGE_1DAY",
            RuleId::TightRange3Day => "TIGHT_RANGE_3DAY",
            RuleId::VolDryup => "VOL_DRYUP",
            RuleId::PriceBreakout => "PRICE_BREAKOUT",
            RuleId::VolConfirm => "VOL_CONFIRM",
            RuleId::Momentum => "MOMENTUM",
            RuleId::AboveMa21 => "ABOVE_MA21",
            RuleId::MaCross => "MA_CROSS",
            RuleId::RelStrength => "REL_STRENGTH",
            RuleId::AboveMa126 => "ABOVE_MA126",
            RuleId::MaStack => "MA_STACK",
            RuleId::StrongMom => "STRONG_MOM",
            RuleId::LowDrawdown => "LOW_DRAWDOWN",
            RuleId::Overextended => "OVEREXTENDED",
            RuleId::Divergence => "DIVERGENCE",
            RuleId::ClimaxVol => "CLIMAX_VOL",
            RuleId::PriceBelowMa21 => "PRICE_BELOW_MA21",
            RuleId::VolumeDecline => "VOLUME_DECLINE",
            RuleId::MomentumDown => "MOMENTUM_DOWN",
        }
    }

    fn bit(&self) -> u32 {
        1 << (*self as u32)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown rule '{s}'"))
    }
}

/// The set of rules that hold on one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RuleFlags(u32);

impl RuleFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn set(&mut self, rule: RuleId, holds: bool) {
        if holds {
            self.0 |= rule.bit();
        } else {
            self.0 &= !rule.bit();
        }
    }

    pub fn with(mut self, rule: RuleId) -> Self {
        self.set(rule, true);
        self
    }

    pub fn contains(&self, rule: RuleId) -> bool {
        self.0 & rule.bit() != 0
    }

    /// How many of `rules` hold.
    pub fn count_of(&self, rules: &[RuleId]) -> usize {
        rules.iter().filter(|r| self.contains(**r)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        RuleId::ALL.into_iter().filter(|r| self.contains(*r))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<RuleId> for RuleFlags {
    fn from_iter<I: IntoIterator<Item = RuleId>>(iter: I) -> Self {
        iter.into_iter().fold(RuleFlags::empty(), RuleFlags::with)
    }
}

// Serialized as the list of rule names that hold.
impl Serialize for RuleFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RuleFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rules = Vec::<RuleId>::deserialize(deserializer)?;
        Ok(rules.into_iter().collect())
    }
}
