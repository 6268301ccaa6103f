//! Stage runs: run-length encoding of the forward-filled stage column.

use serde::{Deserialize, Serialize};

use crate::domain::Stage;
use crate::stages::table::StageTable;

/// Where a row sits inside its stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPosition {
    pub run_id: u32,
    /// 1-based position within the run.
    pub stage_age: u32,
    pub days_remaining: u32,
}

impl RunPosition {
    pub fn is_run_start(&self) -> bool {
        self.stage_age == 1
    }
}

/// Assign run ids, ages and remaining holding days.
pub fn stage_runs(stages: &[Stage], table: &StageTable) -> Vec<RunPosition> {
    let mut out = Vec::with_capacity(stages.len());
    let mut run_id = 0u32;
    let mut age = 0u32;
    let mut prev: Option<Stage> = None;

    for &stage in stages {
        if prev.is_some_and(|p| p != stage) {
            run_id += 1;
            age = 0;
        }
        age += 1;
        prev = Some(stage);

        let optimal = table.get(stage).optimal_days;
        out.push(RunPosition {
            run_id,
            stage_age: age,
            days_remaining: (optimal + 1).saturating_sub(age),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_split_on_stage_change() {
        let table = StageTable::default();
        let stages = [
            Stage::Setup,
            Stage::Setup,
            Stage::Breakout,
            Stage::Breakout,
            Stage::Breakout,
            Stage::Setup,
        ];
        let runs = stage_runs(&stages, &table);
        let ids: Vec<u32> = runs.iter().map(|r| r.run_id).collect();
        let ages: Vec<u32> = runs.iter().map(|r| r.stage_age).collect();
        assert_eq!(ids, vec![0, 0, 1, 1, 1, 2]);
        assert_eq!(ages, vec![1, 2, 1, 2, 3, 1]);
        assert!(runs[2].is_run_start());
    }

    #[test]
    fn days_remaining_counts_down_to_zero() {
        let table = StageTable::default();
        // Breakout optimal_days = 5.
        let stages = vec![Stage::Breakout; 8];
        let remaining: Vec<u32> = stage_runs(&stages, &table)
            .iter()
            .map(|r| r.days_remaining)
            .collect();
        assert_eq!(remaining, vec![5, 4, 3, 2, 1, 0, 0, 0]);
    }
}
