//! Edge trigger module
//!
//! The state machine that reveals the watched segment's windows when the
//! cursor touches its edge and conceals them again when they lose focus.

mod controller;
mod state;

pub use controller::EdgeTrigger;
pub use state::{TriggerPhase, TriggerState};

use thiserror::Error;

/// Trigger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("No windows are assigned to any edge segment")]
    NoAssignments,
}

pub type TriggerResult<T> = Result<T, TriggerError>;
