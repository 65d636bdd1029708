//! Trigger phases

use crate::screen::EdgeSegment;

/// Where the edge trigger is in its show/hide cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    /// Not watching anything; assigned windows are in their normal place
    Disabled,
    /// Watching the cursor, nothing shown
    Idle,
    /// Windows of the segment are sliding into view
    Revealing(EdgeSegment),
    /// Windows of the segment are fully visible
    Shown(EdgeSegment),
    /// Windows of the segment are sliding back out
    Concealing(EdgeSegment),
}

impl TriggerPhase {
    pub fn is_enabled(self) -> bool {
        self != TriggerPhase::Disabled
    }

    /// Snapshot of the active segment and whether it is fully shown
    pub fn state(self) -> TriggerState {
        match self {
            TriggerPhase::Revealing(segment) => TriggerState {
                active_segment: Some(segment),
                is_showing: false,
            },
            TriggerPhase::Shown(segment) => TriggerState {
                active_segment: Some(segment),
                is_showing: true,
            },
            _ => TriggerState::default(),
        }
    }
}

impl std::fmt::Display for TriggerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerPhase::Disabled => write!(f, "disabled"),
            TriggerPhase::Idle => write!(f, "idle"),
            TriggerPhase::Revealing(segment) => write!(f, "revealing {}", segment),
            TriggerPhase::Shown(segment) => write!(f, "showing {}", segment),
            TriggerPhase::Concealing(segment) => write!(f, "concealing {}", segment),
        }
    }
}

/// The segment currently popped out, if any.
///
/// `active_segment` is set as soon as a reveal starts; `is_showing` only once
/// every window of the reveal has arrived. Both clear the moment a conceal
/// starts, so a new reveal can begin while the old windows are still moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerState {
    pub active_segment: Option<EdgeSegment>,
    pub is_showing: bool,
}
