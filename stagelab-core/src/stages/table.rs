//! Declarative stage table: each stage's rule-set, holding horizon, stop
//! multiplier, return targets and stop floors.
//!
//! The table is immutable once built and is injected into the classifier,
//! the level calculator and the lifecycle machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Stage;
use crate::engine::IndicatorRow;
use crate::rules::RuleId;

/// Which stage wins when several rule-sets fully match the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    HighestStage,
    LowestStage,
}

/// Named rule-set variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Default,
    /// SETUP requires a 3-day tight range instead of a single day.
    Strict,
}

/// Indicator a stop floor is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorAnchor {
    SwingLow5,
    SwingLow10,
    Ma21,
    Ma50,
}

impl FloorAnchor {
    pub fn value(&self, row: &IndicatorRow) -> Option<f64> {
        match self {
            FloorAnchor::SwingLow5 => row.low_5d,
            FloorAnchor::SwingLow10 => row.low_10d,
            FloorAnchor::Ma21 => row.ma_21,
            FloorAnchor::Ma50 => row.ma_50,
        }
    }
}

/// `factor × anchor`; the stop is never set below the highest defined floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopFloor {
    pub anchor: FloorAnchor,
    pub factor: f64,
}

impl StopFloor {
    pub const fn new(anchor: FloorAnchor, factor: f64) -> Self {
        Self { anchor, factor }
    }

    pub fn level(&self, row: &IndicatorRow) -> Option<f64> {
        self.anchor.value(row).map(|v| v * self.factor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub stage: Stage,
    pub rules: Vec<RuleId>,
    pub optimal_days: u32,
    /// ATR multiple for the baseline stop distance.
    pub base_stop_pct: f64,
    /// Percent return targets.
    pub min_return_pct: f64,
    pub max_return_pct: f64,
    pub floors: Vec<StopFloor>,
}

impl StageDef {
    fn new(
        stage: Stage,
        rules: &[RuleId],
        optimal_days: u32,
        base_stop_pct: f64,
        (min_return_pct, max_return_pct): (f64, f64),
        floors: &[StopFloor],
    ) -> Self {
        Self {
            stage,
            rules: rules.to_vec(),
            optimal_days,
            base_stop_pct,
            min_return_pct,
            max_return_pct,
            floors: floors.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTable {
    defs: Vec<StageDef>,
    tie_break: TieBreak,
}

impl Default for StageTable {
    fn default() -> Self {
        Self::for_scenario(Scenario::Default)
    }
}

impl StageTable {
    pub fn for_scenario(scenario: Scenario) -> Self {
        use FloorAnchor::*;
        use RuleId::*;

        let setup_range = match scenario {
            Scenario::Default => TightRange1Day,
            Scenario::Strict => TightRange3Day,
        };
        let defs = vec![
            StageDef::new(
                Stage::Setup,
                &[LowVol, setup_range, VolDryup],
                10,
                1.5,
                (2.0, 8.0),
                &[StopFloor::new(SwingLow5, 0.99)],
            ),
            StageDef::new(
                Stage::Breakout,
                &[PriceBreakout, VolConfirm, Momentum],
                5,
                2.0,
                (5.0, 15.0),
                &[StopFloor::new(SwingLow5, 0.98)],
            ),
            StageDef::new(
                Stage::EarlyMom,
                &[AboveMa21, MaCross, RelStrength, Momentum],
                21,
                2.5,
                (8.0, 25.0),
                &[StopFloor::new(Ma21, 0.97)],
            ),
            StageDef::new(
                Stage::Sustained,
                &[AboveMa126, MaStack, StrongMom, LowDrawdown],
                42,
                3.0,
                (15.0, 50.0),
                &[StopFloor::new(Ma50, 0.95), StopFloor::new(SwingLow10, 0.95)],
            ),
            StageDef::new(
                Stage::Extended,
                &[Overextended, Divergence, ClimaxVol],
                5,
                1.0,
                (3.0, 10.0),
                &[],
            ),
            StageDef::new(
                Stage::Distribution,
                &[PriceBelowMa21, VolumeDecline, MomentumDown],
                5,
                2.0,
                (0.0, 0.0),
                &[],
            ),
        ];
        Self {
            defs,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Replace one stage's rule-set.
    pub fn with_rules(mut self, stage: Stage, rules: Vec<RuleId>) -> Self {
        self.def_mut(stage).rules = rules;
        self
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn get(&self, stage: Stage) -> &StageDef {
        &self.defs[stage.id() as usize]
    }

    fn def_mut(&mut self, stage: Stage) -> &mut StageDef {
        &mut self.defs[stage.id() as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDef> {
        self.defs.iter()
    }

    fn apply(&mut self, stage: Stage, o: &StageOverride) {
        let def = self.def_mut(stage);
        if let Some(rules) = &o.rules {
            def.rules = rules.clone();
        }
        if let Some(days) = o.optimal_days {
            def.optimal_days = days;
        }
        if let Some(pct) = o.base_stop_pct {
            def.base_stop_pct = pct;
        }
        if let Some(pct) = o.min_return_pct {
            def.min_return_pct = pct;
        }
        if let Some(pct) = o.max_return_pct {
            def.max_return_pct = pct;
        }
    }
}

/// Partial replacement of one stage's settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageOverride {
    pub rules: Option<Vec<RuleId>>,
    pub optimal_days: Option<u32>,
    pub base_stop_pct: Option<f64>,
    pub min_return_pct: Option<f64>,
    pub max_return_pct: Option<f64>,
}

/// Serializable recipe for a `StageTable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub scenario: Scenario,
    pub tie_break: TieBreak,
    pub overrides: BTreeMap<Stage, StageOverride>,
}

impl StageSettings {
    pub fn build(&self) -> StageTable {
        let mut table = StageTable::for_scenario(self.scenario).with_tie_break(self.tie_break);
        for (stage, o) in &self.overrides {
            table.apply(*stage, o);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_values() {
        let table = StageTable::default();
        let sustained = table.get(Stage::Sustained);
        assert_eq!(sustained.optimal_days, 42);
        assert_eq!(sustained.base_stop_pct, 3.0);
        assert_eq!(sustained.floors.len(), 2);
        assert_eq!(table.get(Stage::Extended).base_stop_pct, 1.0);
        assert_eq!(table.get(Stage::Distribution).base_stop_pct, 2.0);
        assert_eq!(table.tie_break(), TieBreak::HighestStage);
        for (i, def) in table.iter().enumerate() {
            assert_eq!(def.stage.id() as usize, i);
            assert!((3..=4).contains(&def.rules.len()));
        }
    }

    #[test]
    fn strict_scenario_uses_three_day_range() {
        let table = StageTable::for_scenario(Scenario::Strict);
        let rules = &table.get(Stage::Setup).rules;
        assert!(rules.contains(&RuleId::TightRange3Day));
        assert!(!rules.contains(&RuleId::TightRange1Day));
    }

    #[test]
    fn overrides_apply() {
        let mut settings = StageSettings::default();
        settings.overrides.insert(
            Stage::Breakout,
            StageOverride {
                optimal_days: Some(8),
                max_return_pct: Some(20.0),
                ..StageOverride::default()
            },
        );
        let table = settings.build();
        assert_eq!(table.get(Stage::Breakout).optimal_days, 8);
        assert_eq!(table.get(Stage::Breakout).max_return_pct, 20.0);
        assert_eq!(table.get(Stage::Breakout).min_return_pct, 5.0);
    }

    #[test]
    fn floor_levels() {
        let row = IndicatorRow {
            ma_50: Some(100.0),
            low_10d: Some(90.0),
            ..IndicatorRow::default()
        };
        let table = StageTable::default();
        let floors = &table.get(Stage::Sustained).floors;
        let levels: Vec<Option<f64>> = floors.iter().map(|f| f.level(&row)).collect();
        assert_eq!(levels, vec![Some(95.0), Some(85.5)]);
    }

    #[test]
    fn settings_from_json() {
        let json = r#"{"scenario":"strict","tie_break":"lowest_stage","overrides":{"SUSTAINED":{"optimal_days":30}}}"#;
        let settings: StageSettings = serde_json::from_str(json).unwrap();
        let table = settings.build();
        assert_eq!(table.tie_break(), TieBreak::LowestStage);
        assert_eq!(table.get(Stage::Sustained).optimal_days, 30);
    }
}
