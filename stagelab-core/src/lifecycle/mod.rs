//! Trade Lifecycle State Machine.

pub mod machine;
pub mod status;

pub use machine::{LifecycleStep, TradeLifecycle, TradeState};
pub use status::{ExitReason, TradeAction, TradeStatus};
