//! Session lifecycle
//!
//! A [`Session`] owns the edge trigger and drives it from a single-threaded
//! event loop: the cursor and focus polls, the animation deadline and
//! commands from [`SessionHandle`]s. Whatever ends the loop, every assigned
//! window is put back where it was before `run` returns.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, sleep_until, Instant, Interval, MissedTickBehavior};

use crate::assignments::{AnimationOptions, AssignmentError, AssignmentResult};
use crate::config::TriggerConfig;
use crate::platform::{WindowHandle, WindowSystem};
use crate::screen::EdgeSegment;
use crate::trigger::{EdgeTrigger, TriggerError, TriggerPhase, TriggerResult};

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error("Session is no longer running")]
    Closed,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Requests accepted by a running session
#[derive(Debug)]
pub enum SessionCommand {
    Assign {
        segment: EdgeSegment,
        handle: WindowHandle,
        options: AnimationOptions,
        reply: oneshot::Sender<AssignmentResult<bool>>,
    },
    Unassign {
        segment: EdgeSegment,
        handle: WindowHandle,
        reply: oneshot::Sender<bool>,
    },
    Watch {
        segment: Option<EdgeSegment>,
    },
    Enable {
        reply: oneshot::Sender<TriggerResult<()>>,
    },
    Disable,
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
    Shutdown,
}

/// Snapshot of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: TriggerPhase,
    pub watched: Option<EdgeSegment>,
    pub assignments: usize,
    /// Whether any window is still sliding
    pub animating: bool,
}

/// Cloneable sender side of a session.
///
/// The session loop ends once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn assign(
        &self,
        segment: EdgeSegment,
        handle: WindowHandle,
        options: AnimationOptions,
    ) -> SessionResult<bool> {
        let added = self
            .request(|reply| SessionCommand::Assign {
                segment,
                handle,
                options,
                reply,
            })
            .await??;
        Ok(added)
    }

    pub async fn unassign(&self, segment: EdgeSegment, handle: WindowHandle) -> SessionResult<bool> {
        self.request(|reply| SessionCommand::Unassign {
            segment,
            handle,
            reply,
        })
        .await
    }

    pub async fn watch(&self, segment: Option<EdgeSegment>) -> SessionResult<()> {
        self.send(SessionCommand::Watch { segment }).await
    }

    pub async fn enable(&self) -> SessionResult<()> {
        self.request(|reply| SessionCommand::Enable { reply }).await??;
        Ok(())
    }

    pub async fn disable(&self) -> SessionResult<()> {
        self.send(SessionCommand::Disable).await
    }

    pub async fn status(&self) -> SessionResult<SessionStatus> {
        self.request(|reply| SessionCommand::Status { reply }).await
    }

    /// Ask the session to restore everything and stop
    pub async fn shutdown(&self) -> SessionResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, command: SessionCommand) -> SessionResult<()> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SessionResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| SessionError::Closed)
    }
}

/// What woke the event loop
enum Wake {
    Cursor,
    Focus,
    Animation,
    Command(Option<SessionCommand>),
}

/// Owns the trigger and runs its event loop
pub struct Session<W: WindowSystem> {
    trigger: EdgeTrigger<W>,
    commands: mpsc::Receiver<SessionCommand>,
    edge_poll: Duration,
    focus_poll: Duration,
}

impl<W: WindowSystem> Session<W> {
    /// Create a session and the first handle to it
    pub fn new(system: W, config: &TriggerConfig) -> (Self, SessionHandle) {
        let (tx, commands) = mpsc::channel(64);
        let session = Self {
            trigger: EdgeTrigger::new(system, config),
            commands,
            edge_poll: config.edge_poll(),
            focus_poll: config.focus_poll(),
        };
        (session, SessionHandle { tx })
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.trigger.phase(),
            watched: self.trigger.watched(),
            assignments: self.trigger.store().len(),
            animating: self.trigger.is_animating(),
        }
    }

    /// Run until shutdown is requested or every handle is dropped.
    ///
    /// Assigned windows are restored before this returns.
    pub async fn run(&mut self) {
        let mut edge_ticks = poll_interval(self.edge_poll);
        let mut focus_ticks = poll_interval(self.focus_poll);

        tracing::debug!(
            "Session loop started (cursor every {:?}, focus every {:?})",
            self.edge_poll,
            self.focus_poll
        );

        loop {
            let enabled = self.trigger.is_enabled();
            let deadline = self.trigger.next_animation_deadline();

            let wake = tokio::select! {
                _ = edge_ticks.tick(), if enabled => Wake::Cursor,
                _ = focus_ticks.tick(), if enabled => Wake::Focus,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Wake::Animation
                }
                command = self.commands.recv() => Wake::Command(command),
            };

            match wake {
                Wake::Cursor => self.trigger.on_cursor_tick(Instant::now()),
                Wake::Focus => self.trigger.on_focus_tick(Instant::now()),
                Wake::Animation => {
                    self.trigger.on_animation_tick(Instant::now());
                }
                Wake::Command(Some(SessionCommand::Shutdown)) => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                Wake::Command(Some(command)) => {
                    let was_enabled = self.trigger.is_enabled();
                    self.handle_command(command);
                    if !was_enabled && self.trigger.is_enabled() {
                        // Polling starts one full period after enabling
                        edge_ticks.reset();
                        focus_ticks.reset();
                    }
                }
                Wake::Command(None) => {
                    tracing::debug!("All session handles dropped");
                    break;
                }
            }
        }

        // Refuse further commands; queued ones are dropped unanswered
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            tracing::debug!("Discarding {:?} received during shutdown", command);
        }

        self.trigger.shutdown();
        tracing::info!("Session stopped; all windows restored");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        let now = Instant::now();
        match command {
            SessionCommand::Assign {
                segment,
                handle,
                options,
                reply,
            } => {
                let _ = reply.send(self.trigger.assign(segment, handle, options, now));
            }
            SessionCommand::Unassign {
                segment,
                handle,
                reply,
            } => {
                let _ = reply.send(self.trigger.unassign(segment, handle));
            }
            SessionCommand::Watch { segment } => self.trigger.set_watched(segment),
            SessionCommand::Enable { reply } => {
                let result = self.trigger.enable(now);
                if let Err(e) = &result {
                    tracing::warn!("Cannot enable: {}", e);
                }
                let _ = reply.send(result);
            }
            SessionCommand::Disable => self.trigger.disable(now),
            SessionCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            // Handled by the loop
            SessionCommand::Shutdown => {}
        }
    }
}

fn poll_interval(period: Duration) -> Interval {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeWindowSystem;
    use crate::platform::ExStyle;
    use crate::screen::{Point, Rect};
    use crate::trigger::TriggerState;
    use tokio::time::sleep;

    const NOTES: WindowHandle = WindowHandle(0x10);
    const OTHER: WindowHandle = WindowHandle(0x99);
    const NOTES_RECT: Rect = Rect::new(100, 100, 500, 400);

    fn options() -> AnimationOptions {
        AnimationOptions {
            step_count: 4,
            tick_interval_ms: 15,
            use_easing: false,
            use_fade: false,
        }
    }

    fn system() -> FakeWindowSystem {
        let system = FakeWindowSystem::new();
        system.add_window(NOTES, "Notes", NOTES_RECT);
        system.add_window(OTHER, "Other", Rect::new(300, 300, 900, 900));
        system
    }

    fn session(system: &FakeWindowSystem) -> (Session<&FakeWindowSystem>, SessionHandle) {
        Session::new(system, &TriggerConfig::default())
    }

    fn in_taskbar(system: &FakeWindowSystem) -> bool {
        let style = system.window(NOTES).style;
        style.contains(ExStyle::APPWINDOW) && !style.contains(ExStyle::TOOLWINDOW)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_and_conceal_cycle() {
        let system = system();
        let (mut session, handle) = session(&system);

        let client = async {
            assert!(handle
                .assign(EdgeSegment::TopLeft, NOTES, options())
                .await
                .unwrap());
            handle.watch(Some(EdgeSegment::TopLeft)).await.unwrap();
            handle.enable().await.unwrap();

            // 4 steps of 15ms
            sleep(Duration::from_millis(100)).await;
            assert_eq!(system.window(NOTES).rect.origin(), Point::new(100, -302));
            assert!(!in_taskbar(&system));

            system.set_cursor(10, 0);
            sleep(Duration::from_millis(200)).await;
            let status = handle.status().await.unwrap();
            assert_eq!(status.phase, TriggerPhase::Shown(EdgeSegment::TopLeft));
            assert!(!status.animating);
            assert_eq!(system.window(NOTES).rect.origin(), NOTES_RECT.origin());
            assert_eq!(system.foreground_requests(), vec![NOTES]);

            // Focus leaves; the next focus poll starts the conceal
            system.set_cursor(960, 540);
            system.set_foreground(Some(OTHER));
            sleep(Duration::from_millis(201)).await;
            let status = handle.status().await.unwrap();
            assert_eq!(status.phase.state(), TriggerState::default());

            sleep(Duration::from_millis(100)).await;
            let status = handle.status().await.unwrap();
            assert_eq!(status.phase, TriggerPhase::Idle);
            assert_eq!(status.assignments, 1);
            assert_eq!(system.window(NOTES).rect.origin(), Point::new(100, -302));

            handle.shutdown().await.unwrap();
        };

        tokio::join!(session.run(), client);

        assert_eq!(system.window(NOTES).rect.origin(), NOTES_RECT.origin());
        assert!(in_taskbar(&system));
        assert_eq!(session.status().phase, TriggerPhase::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_without_assignments_fails() {
        let system = system();
        let (mut session, handle) = session(&system);

        let client = async {
            let result = handle.enable().await;
            assert!(matches!(
                result,
                Err(SessionError::Trigger(TriggerError::NoAssignments))
            ));
            assert_eq!(handle.status().await.unwrap().phase, TriggerPhase::Disabled);
            drop(handle);
        };

        tokio::join!(session.run(), client);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_restores_windows() {
        let system = system();
        let (mut session, handle) = session(&system);

        let client = async move {
            handle
                .assign(EdgeSegment::LeftBottom, NOTES, options())
                .await
                .unwrap();
            handle.enable().await.unwrap();

            // Stop halfway through the slide
            sleep(Duration::from_millis(31)).await;
            drop(handle);
        };

        tokio::join!(session.run(), client);

        let window = system.window(NOTES);
        assert_eq!(window.rect, NOTES_RECT);
        assert!(window.moves.len() >= 2);
        assert!(in_taskbar(&system));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_stops_polling() {
        let system = system();
        let (mut session, handle) = session(&system);

        let client = async {
            handle
                .assign(EdgeSegment::TopLeft, NOTES, options())
                .await
                .unwrap();
            handle.watch(Some(EdgeSegment::TopLeft)).await.unwrap();
            handle.enable().await.unwrap();
            sleep(Duration::from_millis(100)).await;

            handle.disable().await.unwrap();
            sleep(Duration::from_millis(100)).await;
            assert_eq!(system.window(NOTES).rect.origin(), NOTES_RECT.origin());
            assert!(in_taskbar(&system));

            let moves = system.window(NOTES).moves.len();
            system.set_cursor(10, 0);
            sleep(Duration::from_millis(500)).await;
            assert_eq!(system.window(NOTES).moves.len(), moves);

            handle.shutdown().await.unwrap();
            assert!(matches!(handle.status().await, Err(SessionError::Closed)));
        };

        tokio::join!(session.run(), client);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assign_errors_and_unassign() {
        let system = system();
        let (mut session, handle) = session(&system);

        let client = async {
            assert!(handle
                .assign(EdgeSegment::TopRight, NOTES, options())
                .await
                .unwrap());
            assert!(!handle
                .assign(EdgeSegment::TopRight, NOTES, options())
                .await
                .unwrap());
            assert!(matches!(
                handle
                    .assign(EdgeSegment::TopRight, WindowHandle(0x55), options())
                    .await,
                Err(SessionError::Assignment(_))
            ));

            assert!(handle.unassign(EdgeSegment::TopRight, NOTES).await.unwrap());
            assert!(!handle.unassign(EdgeSegment::TopRight, NOTES).await.unwrap());
            assert_eq!(handle.status().await.unwrap().assignments, 0);
            handle.shutdown().await.unwrap();
        };

        tokio::join!(session.run(), client);
        assert_eq!(session.status().assignments, 0);
    }

    #[test]
    fn test_handle_outliving_session() {
        let system = system();
        let (session, handle) = session(&system);
        drop(session);

        let result = tokio_test::block_on(handle.status());
        assert!(matches!(result, Err(SessionError::Closed)));
        let result = tokio_test::block_on(handle.shutdown());
        assert!(matches!(result, Err(SessionError::Closed)));
    }
}
