//! Stage Classifier: stage table, full-match classification with
//! forward-fill, close-to-stage detection and stage runs.

pub mod classifier;
pub mod runs;
pub mod table;

pub use classifier::{Classification, StageClassifier, StageSet};
pub use runs::{stage_runs, RunPosition};
pub use table::{
    FloorAnchor, Scenario, StageDef, StageOverride, StageSettings, StageTable, StopFloor,
    TieBreak,
};
