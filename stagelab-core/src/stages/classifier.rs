//! Stage Classifier.
//!
//! One left-to-right pass per security produces:
//! - the raw full-match stage of each row (if any),
//! - the forward-filled stage (baseline SETUP before the first match),
//! - the close-to-stage set: stages not currently held whose rule-set is
//!   fully met or misses exactly one rule.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::Stage;
use crate::rules::RuleFlags;
use crate::stages::table::{StageTable, TieBreak};

/// Small set of stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StageSet(u8);

impl StageSet {
    pub fn insert(&mut self, stage: Stage) {
        self.0 |= 1 << stage.id();
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0 & (1 << stage.id()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ALL.into_iter().filter(|s| self.contains(*s))
    }

    /// The most advanced stage in the set.
    pub fn highest(&self) -> Option<Stage> {
        self.iter().last()
    }
}

impl FromIterator<Stage> for StageSet {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        let mut set = StageSet::default();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

impl Serialize for StageSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for StageSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Stage>::deserialize(deserializer)?.into_iter().collect())
    }
}

/// Per-row classifier output for one security.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Full rule-set match on the row itself, after the tie-break.
    pub matched: Vec<Option<Stage>>,
    /// Forward-filled stage.
    pub stages: Vec<Stage>,
    pub close_to: Vec<StageSet>,
}

pub struct StageClassifier<'a> {
    table: &'a StageTable,
}

impl<'a> StageClassifier<'a> {
    pub fn new(table: &'a StageTable) -> Self {
        Self { table }
    }

    /// Stages whose whole rule-set holds. Empty rule-sets never match.
    fn full_matches(&self, flags: &RuleFlags) -> StageSet {
        self.table
            .iter()
            .filter(|def| !def.rules.is_empty() && flags.count_of(&def.rules) == def.rules.len())
            .map(|def| def.stage)
            .collect()
    }

    fn pick(&self, matches: StageSet) -> Option<Stage> {
        match self.table.tie_break() {
            TieBreak::HighestStage => matches.highest(),
            TieBreak::LowestStage => matches.iter().next(),
        }
    }

    fn close_to(&self, flags: &RuleFlags, current: Stage) -> StageSet {
        self.table
            .iter()
            .filter(|def| def.stage != current && !def.rules.is_empty())
            .filter(|def| {
                let needed = def.rules.len().saturating_sub(1).max(1);
                flags.count_of(&def.rules) >= needed
            })
            .map(|def| def.stage)
            .collect()
    }

    pub fn classify(&self, flags: &[RuleFlags]) -> Classification {
        let mut out = Classification {
            matched: Vec::with_capacity(flags.len()),
            stages: Vec::with_capacity(flags.len()),
            close_to: Vec::with_capacity(flags.len()),
        };
        let mut current = Stage::BASELINE;

        for row in flags {
            let matched = self.pick(self.full_matches(row));
            if let Some(stage) = matched {
                current = stage;
            }
            out.matched.push(matched);
            out.stages.push(current);
            out.close_to.push(self.close_to(row, current));
        }
        out
    }
}
