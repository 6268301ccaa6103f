//! Per-security pipeline: indicators → rules → stages → levels → lifecycle.
//!
//! Every step is a sequential left-to-right pass over one security's rows.
//! Securities share nothing but the immutable configuration, so callers
//! fan out across securities freely.

use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::domain::{SecurityId, SecuritySeries, Stage};
use crate::engine::{Diagnostic, IndicatorEngine, IndicatorRow};
use crate::levels::{LevelCalculator, RiskLevels};
use crate::lifecycle::{LifecycleStep, TradeLifecycle, TradeState};
use crate::rules::{RuleEvaluator, RuleFlags, RuleThresholds};
use crate::stages::{stage_runs, RunPosition, StageClassifier, StageSet, StageSettings, StageTable};

/// Thresholds and stage table every security is processed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub rules: RuleThresholds,
    pub stages: StageSettings,
}

/// One fully processed row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    #[serde(flatten)]
    pub indicators: IndicatorRow,
    pub rules: RuleFlags,
    /// Full rule-set match on this row, before forward-fill.
    pub matched_stage: Option<Stage>,
    pub stage: Stage,
    pub stage_name: &'static str,
    pub close_to: StageSet,
    #[serde(flatten)]
    pub run: RunPosition,
    #[serde(flatten)]
    pub levels: RiskLevels,
    #[serde(flatten)]
    pub trade: TradeState,
}

/// Full processed history of one security.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityTimeline {
    pub security: SecurityId,
    pub rows: Vec<TimelineRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SecurityTimeline {
    /// Row dated exactly `date`.
    pub fn row_at(&self, date: chrono::NaiveDate) -> Option<&TimelineRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.indicators.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn last(&self) -> Option<&TimelineRow> {
        self.rows.last()
    }
}

pub struct StagePipeline {
    engine: IndicatorEngine,
    evaluator: RuleEvaluator,
    table: StageTable,
}

impl StagePipeline {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(),
            evaluator: RuleEvaluator::new(config.rules.clone()),
            table: config.stages.build(),
        }
    }

    pub fn with_parts(engine: IndicatorEngine, evaluator: RuleEvaluator, table: StageTable) -> Self {
        Self {
            engine,
            evaluator,
            table,
        }
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    pub fn process(&self, series: &SecuritySeries) -> SecurityTimeline {
        let _span = debug_span!("security", id = %series.id, bars = series.len()).entered();

        let output = self.engine.compute(series.bars());
        let mut diagnostics = Vec::new();
        if series.duplicates_dropped() > 0 {
            diagnostics.push(Diagnostic::DuplicateDates {
                dropped: series.duplicates_dropped(),
            });
        }
        diagnostics.extend(output.diagnostics);
        let rows = output.rows;

        let flags = self.evaluator.evaluate(&rows);
        let classification = StageClassifier::new(&self.table).classify(&flags);
        let stages = &classification.stages;
        let runs = stage_runs(stages, &self.table);
        let levels = LevelCalculator::new(&self.table).compute(&rows, stages, &runs);

        let steps: Vec<LifecycleStep> = rows
            .iter()
            .zip(stages)
            .zip(&runs)
            .zip(&levels)
            .map(|(((row, &stage), &run), lv)| LifecycleStep {
                date: row.date,
                close: row.close,
                stage,
                run,
                stop_loss: lv.stop_loss,
                stop_pct: lv.stop_pct,
            })
            .collect();
        let trades = TradeLifecycle::new(&self.table).run(&steps);

        let timeline_rows = rows
            .into_iter()
            .zip(flags)
            .zip(classification.matched)
            .zip(classification.stages.iter().copied())
            .zip(classification.close_to)
            .zip(runs)
            .zip(levels)
            .zip(trades)
            .map(
                |(((((((indicators, rules), matched_stage), stage), close_to), run), levels), trade)| {
                    TimelineRow {
                        indicators,
                        rules,
                        matched_stage,
                        stage,
                        stage_name: stage.name(),
                        close_to,
                        run,
                        levels,
                        trade,
                    }
                },
            )
            .collect();

        SecurityTimeline {
            security: series.id.clone(),
            rows: timeline_rows,
            diagnostics,
        }
    }
}
