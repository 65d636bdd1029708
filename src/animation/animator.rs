//! Stepped window slides
//!
//! Every run moves one window from its start point to its end point in a
//! fixed number of steps, one step per tick of its own interval. The
//! animator owns all live runs and is advanced by the session event loop.

use std::time::Duration;

use tokio::time::Instant;

use super::easing::{fade_alpha, fade_origin, interpolate, smoothstep};
use crate::platform::{PlatformError, WindowHandle, WindowSystem};
use crate::screen::{EdgeSegment, Point};

/// Why a window is sliding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    /// Pop out from the hot edge, then take focus
    Reveal,
    /// Slide back off-screen
    Conceal,
    /// Slide back into view because the trigger is being turned off
    Restore,
}

impl SlideKind {
    pub fn is_revealing(self) -> bool {
        matches!(self, SlideKind::Reveal | SlideKind::Restore)
    }

    pub fn activate_on_arrival(self) -> bool {
        self == SlideKind::Reveal
    }
}

/// Everything needed to start a slide
#[derive(Debug, Clone)]
pub struct SlideRequest {
    pub handle: WindowHandle,
    pub segment: EdgeSegment,
    pub kind: SlideKind,
    pub start: Point,
    pub end: Point,
    pub steps: u32,
    pub interval: Duration,
    pub easing: bool,
    pub fading: bool,
}

/// Reported back to the controller when a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    /// Final step applied; the window sits exactly at its end point
    Arrived {
        handle: WindowHandle,
        segment: EdgeSegment,
        kind: SlideKind,
    },
    /// The window disappeared mid-slide
    Lost {
        handle: WindowHandle,
        segment: EdgeSegment,
        kind: SlideKind,
    },
}

/// One in-flight slide
#[derive(Debug, Clone)]
pub struct AnimationRun {
    request: SlideRequest,
    current_step: u32,
    next_due: Instant,
    /// Opacity the fade starts from
    alpha_from: u8,
    /// Last opacity written, if fading
    alpha: Option<u8>,
}

impl AnimationRun {
    fn new(mut request: SlideRequest, now: Instant, alpha_from: u8) -> Self {
        request.steps = request.steps.max(1);
        let next_due = now + request.interval;
        Self {
            request,
            current_step: 0,
            next_due,
            alpha_from,
            alpha: None,
        }
    }

    pub fn handle(&self) -> WindowHandle {
        self.request.handle
    }

    pub fn kind(&self) -> SlideKind {
        self.request.kind
    }

    #[cfg(test)]
    pub fn progress(&self) -> (u32, u32) {
        (self.current_step, self.request.steps)
    }

    fn is_last_step(&self) -> bool {
        self.current_step >= self.request.steps
    }

    /// Apply the next step. Returns `Ok(true)` once the run has finished.
    fn step(&mut self, system: &dyn WindowSystem) -> Result<bool, PlatformError> {
        let req = &self.request;
        self.current_step += 1;

        let t = f64::from(self.current_step) / f64::from(req.steps);
        let eased = if req.easing { smoothstep(t) } else { t };
        let position = if self.is_last_step() {
            req.end
        } else {
            interpolate(req.start, req.end, eased)
        };

        soft(system.move_window(req.handle, position), req.handle, "move")?;

        if req.fading {
            let alpha = fade_alpha(self.alpha_from, t, req.kind.is_revealing());
            soft(system.set_opacity(req.handle, alpha), req.handle, "fade")?;
            self.alpha = Some(alpha);
        }

        if !self.is_last_step() {
            return Ok(false);
        }

        if req.kind.activate_on_arrival() {
            soft(system.set_topmost(req.handle, req.end), req.handle, "raise")?;
            if !system.set_foreground_window(req.handle) {
                tracing::debug!("Foreground request for window {} refused", req.handle);
            }
        }

        Ok(true)
    }
}

/// Swallow non-fatal adapter failures, pass stale-handle errors through
fn soft(
    result: Result<(), PlatformError>,
    handle: WindowHandle,
    what: &str,
) -> Result<(), PlatformError> {
    match result {
        Err(err) if !err.is_stale() => {
            tracing::warn!("Window {} {} failed: {}", handle, what, err);
            Ok(())
        }
        other => other,
    }
}

/// Drives all live slides
#[derive(Debug, Default)]
pub struct Animator {
    /// Live runs in start order, at most one per handle
    runs: Vec<AnimationRun>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a slide, replacing any run already moving the same window.
    ///
    /// Fading windows are made layered before the first step. A fade picks up
    /// from the opacity the replaced run had reached. Fails only if the
    /// window no longer exists.
    pub fn start(
        &mut self,
        request: SlideRequest,
        now: Instant,
        system: &dyn WindowSystem,
    ) -> Result<(), PlatformError> {
        let superseded = self.take(request.handle);
        if superseded.is_some() {
            tracing::debug!(
                "Superseding in-flight slide of window {} with {:?}",
                request.handle,
                request.kind
            );
        }
        let alpha_from = superseded
            .and_then(|run| run.alpha)
            .unwrap_or_else(|| fade_origin(request.kind.is_revealing()));

        if request.fading {
            soft(system.make_layered(request.handle), request.handle, "layering")?;
        }

        tracing::debug!(
            "Sliding window {} {:?} from ({}, {}) to ({}, {}) in {} steps",
            request.handle,
            request.kind,
            request.start.x,
            request.start.y,
            request.end.x,
            request.end.y,
            request.steps
        );

        self.runs.push(AnimationRun::new(request, now, alpha_from));
        Ok(())
    }

    /// Advance every run that is due at `now` by one step.
    ///
    /// Runs are advanced in start order, so windows of one segment that
    /// started together move in lockstep. Each finished run yields exactly
    /// one event.
    pub fn tick(&mut self, now: Instant, system: &dyn WindowSystem) -> Vec<AnimationEvent> {
        let mut events = Vec::new();

        self.runs.retain_mut(|run| {
            if run.next_due > now {
                return true;
            }

            let handle = run.handle();
            let segment = run.request.segment;
            let kind = run.kind();

            match run.step(system) {
                Ok(false) => {
                    run.next_due = now + run.request.interval;
                    true
                }
                Ok(true) => {
                    events.push(AnimationEvent::Arrived {
                        handle,
                        segment,
                        kind,
                    });
                    false
                }
                Err(err) => {
                    tracing::warn!("Dropping slide of window {}: {}", handle, err);
                    events.push(AnimationEvent::Lost {
                        handle,
                        segment,
                        kind,
                    });
                    false
                }
            }
        });

        events
    }

    /// Cancel the run moving `handle`, if any
    pub fn cancel(&mut self, handle: WindowHandle) -> bool {
        self.take(handle).is_some()
    }

    fn take(&mut self, handle: WindowHandle) -> Option<AnimationRun> {
        let index = self.runs.iter().position(|run| run.handle() == handle)?;
        Some(self.runs.remove(index))
    }

    pub fn cancel_all(&mut self) {
        if !self.runs.is_empty() {
            tracing::debug!("Cancelling {} in-flight slides", self.runs.len());
        }
        self.runs.clear();
    }

    #[cfg(test)]
    pub fn run_for(&self, handle: WindowHandle) -> Option<&AnimationRun> {
        self.runs.iter().find(|run| run.handle() == handle)
    }

    /// When the next step is due, if anything is moving
    pub fn next_deadline(&self) -> Option<Instant> {
        self.runs.iter().map(|run| run.next_due).min()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
