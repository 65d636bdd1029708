//! Assignment store
//!
//! Remembers which windows are pinned to which edge segment, together with
//! the geometry they had when they were pinned and how they should slide.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{ExStyle, PlatformError, WindowHandle, WindowSystem};
use crate::screen::{EdgeSegment, Rect};

/// Assignment errors
#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Cannot read geometry of window {handle}: {source}")]
    Geometry {
        handle: WindowHandle,
        #[source]
        source: PlatformError,
    },
}

pub type AssignmentResult<T> = Result<T, AssignmentError>;

/// How a window slides in and out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationOptions {
    /// Number of discrete steps per slide (at least 1)
    pub step_count: u32,
    /// Time between steps in milliseconds
    pub tick_interval_ms: u64,
    /// Apply smoothstep easing to the position
    pub use_easing: bool,
    /// Fade opacity along with the slide
    pub use_fade: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            step_count: 30,
            tick_interval_ms: 15,
            use_easing: false,
            use_fade: false,
        }
    }
}

impl AnimationOptions {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// One window bound to one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAssignment {
    pub handle: WindowHandle,
    /// Geometry captured at assignment time; restored on shutdown
    pub original_rect: Rect,
    /// Whether the window was always-on-top before it was pinned
    pub was_topmost: bool,
    pub options: AnimationOptions,
}

/// Per-segment ordered lists of window assignments.
///
/// A handle should belong to a single segment at a time. The store does not
/// prevent assigning it to a second segment, but the trigger behavior for
/// such a window is undefined.
#[derive(Debug, Default)]
pub struct AssignmentStore {
    segments: BTreeMap<EdgeSegment, Vec<WindowAssignment>>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `handle` to `segment`, capturing its current rectangle.
    ///
    /// Returns `Ok(false)` without touching anything if the handle is already
    /// in that segment.
    pub fn assign(
        &mut self,
        segment: EdgeSegment,
        handle: WindowHandle,
        options: AnimationOptions,
        system: &dyn WindowSystem,
    ) -> AssignmentResult<bool> {
        if self.contains(segment, handle) {
            return Ok(false);
        }

        let original_rect = system
            .window_rect(handle)
            .map_err(|source| AssignmentError::Geometry { handle, source })?;
        let was_topmost = system
            .extended_style(handle)
            .map(|style| style.contains(ExStyle::TOPMOST))
            .unwrap_or_default();

        if let Some(other) = self.segment_of(handle) {
            tracing::warn!(
                "Window {} is already assigned to {}; also assigning it to {}",
                handle,
                other,
                segment
            );
        }

        let options = AnimationOptions {
            step_count: options.step_count.max(1),
            ..options
        };

        tracing::info!("Assigned window {} {} to {}", handle, original_rect, segment);
        self.segments
            .entry(segment)
            .or_default()
            .push(WindowAssignment {
                handle,
                original_rect,
                was_topmost,
                options,
            });
        Ok(true)
    }

    /// Remove `handle` from `segment`. Returns whether anything was removed.
    pub fn unassign(&mut self, segment: EdgeSegment, handle: WindowHandle) -> bool {
        let Some(list) = self.segments.get_mut(&segment) else {
            return false;
        };
        let before = list.len();
        list.retain(|a| a.handle != handle);
        let removed = list.len() != before;
        if list.is_empty() {
            self.segments.remove(&segment);
        }
        if removed {
            tracing::info!("Unassigned window {} from {}", handle, segment);
        }
        removed
    }

    /// Remove `handle` from every segment, e.g. after the window closed
    pub fn prune(&mut self, handle: WindowHandle) -> bool {
        let segments: Vec<EdgeSegment> = self.segments.keys().copied().collect();
        let mut removed = false;
        for segment in segments {
            removed |= self.unassign(segment, handle);
        }
        removed
    }

    /// Assignments of `segment`, in assignment order
    pub fn list_for(&self, segment: EdgeSegment) -> &[WindowAssignment] {
        self.segments
            .get(&segment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, segment: EdgeSegment, handle: WindowHandle) -> Option<&WindowAssignment> {
        self.list_for(segment).iter().find(|a| a.handle == handle)
    }

    pub fn contains(&self, segment: EdgeSegment, handle: WindowHandle) -> bool {
        self.get(segment, handle).is_some()
    }

    /// First segment `handle` is assigned to
    pub fn segment_of(&self, handle: WindowHandle) -> Option<EdgeSegment> {
        self.iter()
            .find(|(_, a)| a.handle == handle)
            .map(|(segment, _)| segment)
    }

    pub fn has_any(&self) -> bool {
        self.segments.values().any(|list| !list.is_empty())
    }

    pub fn len(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }

    /// All assignments, in segment order then assignment order
    pub fn iter(&self) -> impl Iterator<Item = (EdgeSegment, &WindowAssignment)> {
        self.segments
            .iter()
            .flat_map(|(segment, list)| list.iter().map(move |a| (*segment, a)))
    }
}
