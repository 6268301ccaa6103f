/// Ratchet invariant enforcement for long stops.
///
/// **Core Rule:** within a stage run the stop may rise, never fall (even if
/// ATR expands or the stage floor drops).
///
/// The 99%-of-close cap is applied to the reported stop by the level
/// calculator and never feeds back into the high-water mark.

/// Running high-water mark of a long stop within one stage run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatchetState {
    current_level: Option<f64>,
}

impl RatchetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_level(level: f64) -> Self {
        Self {
            current_level: Some(level),
        }
    }

    /// Apply the ratchet to a proposed stop and return the level in force.
    ///
    /// The first proposal initialises the level; later proposals can only
    /// raise it.
    pub fn apply(&mut self, proposed: f64) -> f64 {
        let level = match self.current_level {
            Some(current) => current.max(proposed),
            None => proposed,
        };
        self.current_level = Some(level);
        level
    }

    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }

    /// Forget the level (new stage run).
    pub fn clear(&mut self) {
        self.current_level = None;
    }
}
