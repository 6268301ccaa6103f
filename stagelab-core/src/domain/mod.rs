//! Domain types for stagelab

pub mod bar;
pub mod security;
pub mod stage;

pub use bar::PriceBar;
pub use security::{SecurityId, SecurityMeta, SecuritySeries};
pub use stage::Stage;
