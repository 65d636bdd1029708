//! Edge trigger controller
//!
//! Polls the cursor and the foreground window, decides when the watched
//! segment's windows pop out or slide away, and hands the actual movement
//! to the [`Animator`].

use std::collections::HashSet;

use tokio::time::Instant;

use super::state::{TriggerPhase, TriggerState};
use super::{TriggerError, TriggerResult};
use crate::animation::{AnimationEvent, Animator, SlideKind, SlideRequest};
use crate::assignments::{
    AnimationOptions, AssignmentResult, AssignmentStore, WindowAssignment,
};
use crate::config::TriggerConfig;
use crate::platform::{PlatformError, WindowHandle, WindowSystem};
use crate::screen::{slide_path, EdgeDetectResult, EdgeDetector, EdgeSegment, Rect};

/// The edge-trigger state machine
pub struct EdgeTrigger<W: WindowSystem> {
    system: W,
    store: AssignmentStore,
    animator: Animator,
    detector: EdgeDetector,
    phase: TriggerPhase,
    /// Segment the user picked for monitoring
    watched: Option<EdgeSegment>,
    /// Windows of the current reveal or conceal batch still in flight
    pending: HashSet<WindowHandle>,
    offscreen_padding: i32,
}

impl<W: WindowSystem> EdgeTrigger<W> {
    pub fn new(system: W, config: &TriggerConfig) -> Self {
        let (width, height) = system.screen_size();
        Self {
            detector: EdgeDetector::new(config.edge_detector(), width, height),
            system,
            store: AssignmentStore::new(),
            animator: Animator::new(),
            phase: TriggerPhase::Disabled,
            watched: None,
            pending: HashSet::new(),
            offscreen_padding: config.offscreen_padding,
        }
    }

    #[cfg(test)]
    pub fn system(&self) -> &W {
        &self.system
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    pub fn state(&self) -> TriggerState {
        self.phase.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.phase.is_enabled()
    }

    pub fn watched(&self) -> Option<EdgeSegment> {
        self.watched
    }

    /// Choose the single segment whose hot edge reveals windows
    pub fn set_watched(&mut self, segment: Option<EdgeSegment>) {
        if self.watched != segment {
            tracing::info!(
                "Watching {}",
                segment.map_or_else(|| "no segment".to_string(), |s| s.to_string())
            );
        }
        self.watched = segment;
        self.detector.reset();
    }

    pub fn is_animating(&self) -> bool {
        !self.animator.is_empty()
    }

    pub fn next_animation_deadline(&self) -> Option<Instant> {
        self.animator.next_deadline()
    }

    /// Pin a window to a segment. While enabled, the window is hidden right away.
    pub fn assign(
        &mut self,
        segment: EdgeSegment,
        handle: WindowHandle,
        options: AnimationOptions,
        now: Instant,
    ) -> AssignmentResult<bool> {
        let added = self.store.assign(segment, handle, options, &self.system)?;
        if added && self.is_enabled() {
            if let Some(assignment) = self.store.get(segment, handle).cloned() {
                self.hide(segment, &assignment, now);
            }
        }
        Ok(added)
    }

    /// Unpin a window. While enabled, the window is put back where it was.
    pub fn unassign(&mut self, segment: EdgeSegment, handle: WindowHandle) -> bool {
        let Some(assignment) = self.store.get(segment, handle).cloned() else {
            return false;
        };
        if self.is_enabled() {
            self.animator.cancel(handle);
            self.restore_in_place(&assignment);
        }
        self.store.unassign(segment, handle);
        if self.pending.remove(&handle) {
            self.settle_batch();
        }
        true
    }

    /// Turn the trigger on: every assigned window leaves the taskbar and
    /// slides off-screen, then polling starts.
    pub fn enable(&mut self, now: Instant) -> TriggerResult<()> {
        if self.is_enabled() {
            return Ok(());
        }
        if !self.store.has_any() {
            return Err(TriggerError::NoAssignments);
        }

        tracing::info!("Enabling edge trigger for {} windows", self.store.len());
        self.phase = TriggerPhase::Idle;
        self.pending.clear();
        self.detector.reset();
        self.refresh_screen_size();

        for (segment, assignment) in self.snapshot() {
            self.hide(segment, &assignment, now);
        }
        Ok(())
    }

    /// Turn the trigger off: polling stops and every assigned window slides
    /// back into view, regaining its taskbar button when it arrives.
    pub fn disable(&mut self, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        tracing::info!("Disabling edge trigger");
        self.phase = TriggerPhase::Disabled;
        self.pending.clear();

        for (segment, assignment) in self.snapshot() {
            if let Err(err) = self.slide(segment, &assignment, SlideKind::Restore, now) {
                self.handle_failure(assignment.handle, &err);
            }
        }
    }

    /// Put every assigned window back at its original rectangle right now,
    /// whatever the trigger is doing. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.animator.cancel_all();
        self.pending.clear();
        if self.is_enabled() {
            tracing::info!("Edge trigger stopped by shutdown");
        }
        self.phase = TriggerPhase::Disabled;

        for (_, assignment) in self.snapshot() {
            self.restore_in_place(&assignment);
        }
    }

    /// Cursor poll: pop out the watched segment when the cursor touches it
    pub fn on_cursor_tick(&mut self, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        self.refresh_screen_size();
        let cursor = match self.system.cursor_position() {
            Ok(cursor) => cursor,
            Err(err) => {
                tracing::debug!("Cursor position unavailable: {}", err);
                return;
            }
        };
        let result = self.detector.check(cursor.x, cursor.y, now);

        // One segment at a time, and never twice
        if self.state().active_segment.is_some() {
            return;
        }
        let Some(watched) = self.watched else {
            return;
        };

        match result {
            EdgeDetectResult::Hit { segment } if segment == watched => self.reveal(segment, now),
            EdgeDetectResult::Dwelling {
                segment,
                remaining_ms,
            } if segment == watched => {
                tracing::trace!("Cursor dwelling on {} ({}ms left)", segment, remaining_ms);
            }
            _ => {}
        }
    }

    /// Focus poll: hide the shown segment once focus moves elsewhere
    pub fn on_focus_tick(&mut self, now: Instant) {
        let TriggerPhase::Shown(segment) = self.phase else {
            return;
        };

        let foreground = self.system.foreground_window();
        let focused_inside = foreground.is_some_and(|fg| {
            self.store
                .list_for(segment)
                .iter()
                .any(|a| a.handle == fg)
        });
        if focused_inside {
            return;
        }

        tracing::debug!(
            "Focus moved to {}; concealing {}",
            foreground.map_or_else(|| "nothing".to_string(), |h| h.to_string()),
            segment
        );
        self.conceal(segment, now);
    }

    /// Animation tick: advance every due slide and react to finished ones
    pub fn on_animation_tick(&mut self, now: Instant) -> Vec<AnimationEvent> {
        let events = self.animator.tick(now, &self.system);

        for event in &events {
            match *event {
                AnimationEvent::Arrived {
                    handle,
                    segment,
                    kind,
                } => self.on_arrival(handle, segment, kind),
                AnimationEvent::Lost { handle, .. } => {
                    self.forget(handle);
                }
            }
        }

        events
    }

    fn on_arrival(&mut self, handle: WindowHandle, segment: EdgeSegment, kind: SlideKind) {
        match (kind, self.phase) {
            (SlideKind::Restore, _) => {
                let result = self.system.set_taskbar_visible(handle, true);
                let result = result.and_then(|()| self.lower(segment, handle));
                if let Err(err) = result {
                    self.handle_failure(handle, &err);
                }
            }
            (SlideKind::Reveal, TriggerPhase::Revealing(active))
            | (SlideKind::Conceal, TriggerPhase::Concealing(active))
                if active == segment =>
            {
                self.pending.remove(&handle);
                self.settle_batch();
            }
            _ => {}
        }
    }

    fn reveal(&mut self, segment: EdgeSegment, now: Instant) {
        let assignments = self.store.list_for(segment).to_vec();
        if assignments.is_empty() {
            return;
        }

        tracing::info!("Revealing {} ({} windows)", segment, assignments.len());
        self.phase = TriggerPhase::Revealing(segment);
        self.start_batch(segment, &assignments, SlideKind::Reveal, now);
    }

    fn conceal(&mut self, segment: EdgeSegment, now: Instant) {
        let assignments = self.store.list_for(segment).to_vec();

        tracing::info!("Concealing {}", segment);
        // Cleared before the slides finish so the edge can fire again
        self.phase = TriggerPhase::Concealing(segment);
        self.start_batch(segment, &assignments, SlideKind::Conceal, now);
    }

    fn start_batch(
        &mut self,
        segment: EdgeSegment,
        assignments: &[WindowAssignment],
        kind: SlideKind,
        now: Instant,
    ) {
        self.pending = assignments.iter().map(|a| a.handle).collect();
        for assignment in assignments {
            if let Err(err) = self.slide(segment, assignment, kind, now) {
                self.handle_failure(assignment.handle, &err);
            }
        }
        self.settle_batch();
    }

    /// Advance the phase once the current batch has nothing left in flight
    fn settle_batch(&mut self) {
        if !self.pending.is_empty() {
            return;
        }

        match self.phase {
            TriggerPhase::Revealing(segment) if self.store.list_for(segment).is_empty() => {
                tracing::debug!("Nothing left to reveal on {}", segment);
                self.phase = TriggerPhase::Idle;
            }
            TriggerPhase::Revealing(segment) => {
                tracing::info!("{} shown", segment);
                self.phase = TriggerPhase::Shown(segment);
            }
            TriggerPhase::Concealing(segment) => {
                tracing::debug!("{} hidden", segment);
                self.phase = TriggerPhase::Idle;
            }
            _ => {}
        }
    }

    /// Take a window off the taskbar and slide it out of view
    fn hide(&mut self, segment: EdgeSegment, assignment: &WindowAssignment, now: Instant) {
        let handle = assignment.handle;
        match self.system.set_taskbar_visible(handle, false) {
            Err(err) if err.is_stale() => {
                self.forget(handle);
                return;
            }
            Err(err) => {
                tracing::warn!("Could not hide window {} from the taskbar: {}", handle, err);
            }
            Ok(()) => {}
        }

        if let Err(err) = self.slide(segment, assignment, SlideKind::Conceal, now) {
            self.handle_failure(handle, &err);
        }
    }

    fn slide(
        &mut self,
        segment: EdgeSegment,
        assignment: &WindowAssignment,
        kind: SlideKind,
        now: Instant,
    ) -> Result<(), PlatformError> {
        let handle = assignment.handle;
        let monitor = match self.system.monitor_bounds(handle) {
            Ok(bounds) => bounds,
            Err(err) if err.is_stale() => return Err(err),
            Err(err) => {
                tracing::warn!("Monitor lookup for window {} failed: {}", handle, err);
                let (width, height) = self.system.screen_size();
                Rect::new(0, 0, width as i32, height as i32)
            }
        };

        let path = slide_path(
            segment.direction(),
            assignment.original_rect,
            monitor,
            self.offscreen_padding,
        );
        let (nominal_start, end) = path.endpoints(kind.is_revealing());

        // Continue from wherever the window is, e.g. halfway through a
        // cancelled slide
        let start = match self.system.window_rect(handle) {
            Ok(rect) => rect.origin(),
            Err(err) if err.is_stale() => return Err(err),
            Err(_) => nominal_start,
        };

        let options = assignment.options;
        let request = SlideRequest {
            handle,
            segment,
            kind,
            start,
            end,
            steps: options.step_count,
            interval: options.tick_interval(),
            easing: options.use_easing,
            fading: options.use_fade,
        };
        self.animator.start(request, now, &self.system)
    }

    /// Direct, non-animated restore of geometry, taskbar button and opacity
    fn restore_in_place(&self, assignment: &WindowAssignment) {
        let handle = assignment.handle;
        let origin = assignment.original_rect.origin();

        let mut result = self.system.move_window(handle, origin);
        if result.is_ok() {
            result = self.system.set_taskbar_visible(handle, true);
        }
        if result.is_ok() && assignment.options.use_fade {
            result = self.system.set_opacity(handle, u8::MAX);
        }
        if result.is_ok() && !assignment.was_topmost {
            result = self.system.clear_topmost(handle);
        }

        match result {
            Ok(()) => tracing::debug!("Restored window {} to {}", handle, assignment.original_rect),
            Err(err) => tracing::warn!("Could not restore window {}: {}", handle, err),
        }
    }

    /// Undo the always-on-top raise of a reveal, unless the window had it already
    fn lower(&self, segment: EdgeSegment, handle: WindowHandle) -> Result<(), PlatformError> {
        match self.store.get(segment, handle) {
            Some(assignment) if !assignment.was_topmost => self.system.clear_topmost(handle),
            _ => Ok(()),
        }
    }

    /// Stale windows are dropped for good; anything else is just logged
    fn handle_failure(&mut self, handle: WindowHandle, err: &PlatformError) {
        if err.is_stale() {
            self.forget(handle);
        } else {
            tracing::warn!("Window {}: {}", handle, err);
        }
    }

    fn forget(&mut self, handle: WindowHandle) {
        tracing::info!("Window {} is gone; dropping its assignment", handle);
        self.animator.cancel(handle);
        self.store.prune(handle);
        if self.pending.remove(&handle) {
            self.settle_batch();
        }
    }

    fn refresh_screen_size(&mut self) {
        let (width, height) = self.system.screen_size();
        self.detector.set_screen_size(width, height);
    }

    fn snapshot(&self) -> Vec<(EdgeSegment, WindowAssignment)> {
        self.store
            .iter()
            .map(|(segment, assignment)| (segment, assignment.clone()))
            .collect()
    }
}

impl<W: WindowSystem> Drop for EdgeTrigger<W> {
    /// Never leave windows parked off-screen or missing from the taskbar
    fn drop(&mut self) {
        if self.is_enabled() || self.is_animating() {
            self.shutdown();
        }
    }
}
