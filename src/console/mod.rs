//! Interactive console for a running session
//!
//! Reads one command per line from stdin and forwards it to the session
//! through a [`SessionHandle`]. The console also listens for the OS exit
//! signals and asks the session to restore every window before the process
//! goes away.

use std::future::Future;
use std::io::{self, BufRead};
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::assignments::AnimationOptions;
use crate::platform::WindowHandle;
use crate::screen::{EdgeSegment, ParseSegmentError};
use crate::session::{SessionError, SessionHandle, SessionResult, SessionStatus};

/// Console input errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("Expected SEGMENT=HANDLE, got '{0}'")]
    InvalidAssignment(String),

    #[error(transparent)]
    Segment(#[from] ParseSegmentError),

    #[error("Invalid window handle '{0}'")]
    InvalidHandle(String),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

pub const HELP: &str = "\
Commands:
  assign SEGMENT=HANDLE    pin a window to a segment
  unassign SEGMENT=HANDLE  unpin a window and put it back
  watch SEGMENT|none       choose the segment whose edge reveals windows
  enable                   hide assigned windows and start watching
  disable                  slide every window back and stop watching
  status                   show what the trigger is doing
  quit                     restore every window and exit";

/// One line of console input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Assign(EdgeSegment, WindowHandle),
    Unassign(EdgeSegment, WindowHandle),
    Watch(Option<EdgeSegment>),
    Enable,
    Disable,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();

        let command = match verb.as_str() {
            "assign" | "a" => {
                let argument = argument.ok_or(ConsoleError::MissingArgument("assign"))?;
                let (segment, handle) = parse_assignment(argument)?;
                ConsoleCommand::Assign(segment, handle)
            }
            "unassign" | "u" => {
                let argument = argument.ok_or(ConsoleError::MissingArgument("unassign"))?;
                let (segment, handle) = parse_assignment(argument)?;
                ConsoleCommand::Unassign(segment, handle)
            }
            "watch" | "w" => match argument.ok_or(ConsoleError::MissingArgument("watch"))? {
                "none" | "off" => ConsoleCommand::Watch(None),
                segment => ConsoleCommand::Watch(Some(segment.parse()?)),
            },
            "enable" | "on" => ConsoleCommand::Enable,
            "disable" | "off" => ConsoleCommand::Disable,
            "status" | "s" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            _ => return Err(ConsoleError::UnknownCommand(s.trim().to_string())),
        };
        Ok(command)
    }
}

/// Parse `SEGMENT=HANDLE`, e.g. `top-left=0x1a2b`
pub fn parse_assignment(s: &str) -> ConsoleResult<(EdgeSegment, WindowHandle)> {
    let (segment, handle) = s
        .split_once('=')
        .ok_or_else(|| ConsoleError::InvalidAssignment(s.to_string()))?;
    let segment = segment.parse::<EdgeSegment>()?;
    let handle = handle
        .parse::<WindowHandle>()
        .map_err(|_| ConsoleError::InvalidHandle(handle.to_string()))?;
    Ok((segment, handle))
}

/// Forward stdin lines from a dedicated thread.
///
/// A blocking read on the runtime would keep it from shutting down, so the
/// thread owns stdin and the channel closes at end of input.
pub fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("popout-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.blocking_send(line).is_err() {
                    break; // Console is gone
                }
            }
        })?;
    Ok(rx)
}

/// Resolve on the first signal that should end the program.
///
/// On Windows this covers Ctrl+C, Ctrl+Break, closing the console window,
/// logoff and system shutdown.
#[cfg(windows)]
pub async fn exit_signal() -> io::Result<&'static str> {
    use tokio::signal::windows;

    let mut ctrl_c = windows::ctrl_c()?;
    let mut ctrl_break = windows::ctrl_break()?;
    let mut close = windows::ctrl_close()?;
    let mut logoff = windows::ctrl_logoff()?;
    let mut shutdown = windows::ctrl_shutdown()?;

    let name = tokio::select! {
        _ = ctrl_c.recv() => "Ctrl+C",
        _ = ctrl_break.recv() => "Ctrl+Break",
        _ = close.recv() => "console close",
        _ = logoff.recv() => "logoff",
        _ = shutdown.recv() => "system shutdown",
    };
    Ok(name)
}

/// Resolve on the first signal that should end the program
#[cfg(unix)]
pub async fn exit_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    };
    Ok(name)
}

#[cfg(not(any(windows, unix)))]
pub async fn exit_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// Run one command against the session and describe the outcome
pub async fn execute(
    handle: &SessionHandle,
    command: ConsoleCommand,
    options: AnimationOptions,
) -> SessionResult<String> {
    let reply = match command {
        ConsoleCommand::Assign(segment, window) => {
            if handle.assign(segment, window, options).await? {
                format!("Assigned {} to {}", window, segment)
            } else {
                format!("{} is already assigned to {}", window, segment)
            }
        }
        ConsoleCommand::Unassign(segment, window) => {
            if handle.unassign(segment, window).await? {
                format!("Unassigned {} from {}", window, segment)
            } else {
                format!("{} is not assigned to {}", window, segment)
            }
        }
        ConsoleCommand::Watch(segment) => {
            handle.watch(segment).await?;
            match segment {
                Some(segment) => format!("Watching {} (slides {})", segment, segment.direction()),
                None => "Not watching any segment".to_string(),
            }
        }
        ConsoleCommand::Enable => {
            handle.enable().await?;
            "Enabled".to_string()
        }
        ConsoleCommand::Disable => {
            handle.disable().await?;
            "Disabled".to_string()
        }
        ConsoleCommand::Status => format_status(&handle.status().await?),
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => "Restoring windows".to_string(),
    };
    Ok(reply)
}

pub fn format_status(status: &SessionStatus) -> String {
    format!(
        "{} | watching {} | {} windows{}",
        status.phase,
        status
            .watched
            .map_or_else(|| "nothing".to_string(), |s| s.to_string()),
        status.assignments,
        if status.animating { " | sliding" } else { "" }
    )
}

/// Serve console lines until `quit`, an exit signal or the session going
/// away, then ask the session to shut down.
pub async fn serve(
    handle: &SessionHandle,
    mut lines: mpsc::Receiver<String>,
    exit: impl Future<Output = io::Result<&'static str>>,
    options: AnimationOptions,
) -> SessionResult<()> {
    tokio::pin!(exit);
    let mut reading = true;
    let mut listening = true;

    loop {
        tokio::select! {
            result = &mut exit, if listening => match result {
                Ok(name) => {
                    tracing::info!("{} received", name);
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to listen for exit signals: {}", e);
                    listening = false;
                }
            },
            line = lines.recv(), if reading => {
                let Some(line) = line else {
                    tracing::debug!("Console input closed");
                    reading = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => match execute(handle, command, options).await {
                        Ok(reply) => println!("{}", reply),
                        Err(SessionError::Closed) => return Err(SessionError::Closed),
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("{}", e),
                }
            }
            else => {
                tracing::warn!("No console input and no exit signals; stopping");
                break;
            }
        }
    }

    match handle.shutdown().await {
        Ok(()) | Err(SessionError::Closed) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::time::Duration;

    use super::*;
    use crate::config::TriggerConfig;
    use crate::platform::fake::FakeWindowSystem;
    use crate::platform::ExStyle;
    use crate::screen::{Point, Rect};
    use crate::session::Session;
    use crate::trigger::TriggerPhase;

    const NOTES: WindowHandle = WindowHandle(0x10);
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
        system
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            "assign top-left=0x10".parse(),
            Ok(ConsoleCommand::Assign(EdgeSegment::TopLeft, NOTES))
        );
        assert_eq!(
            "  UNASSIGN right_bottom=16 ".parse(),
            Ok(ConsoleCommand::Unassign(EdgeSegment::RightBottom, NOTES))
        );
        assert_eq!("watch none".parse(), Ok(ConsoleCommand::Watch(None)));
        assert_eq!(
            "w left-top".parse(),
            Ok(ConsoleCommand::Watch(Some(EdgeSegment::LeftTop)))
        );
        assert_eq!("enable".parse(), Ok(ConsoleCommand::Enable));
        assert_eq!("exit".parse(), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn test_command_errors() {
        assert_eq!(
            "jump".parse::<ConsoleCommand>(),
            Err(ConsoleError::UnknownCommand("jump".to_string()))
        );
        assert_eq!(
            "watch".parse::<ConsoleCommand>(),
            Err(ConsoleError::MissingArgument("watch"))
        );
        assert_eq!(
            "assign top-left".parse::<ConsoleCommand>(),
            Err(ConsoleError::InvalidAssignment("top-left".to_string()))
        );
        assert!(matches!(
            "assign middle=1".parse::<ConsoleCommand>(),
            Err(ConsoleError::Segment(_))
        ));
        assert_eq!(
            "assign top-left=zz".parse::<ConsoleCommand>(),
            Err(ConsoleError::InvalidHandle("zz".to_string()))
        );
    }

    #[test]
    fn test_status_line() {
        let status = SessionStatus {
            phase: TriggerPhase::Shown(EdgeSegment::TopLeft),
            watched: Some(EdgeSegment::TopLeft),
            assignments: 2,
            animating: false,
        };
        assert_eq!(
            format_status(&status),
            "showing top-left | watching top-left | 2 windows"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_drives_session() {
        let system = system();
        let (mut session, handle) = Session::new(&system, &TriggerConfig::default());
        let (tx, lines) = mpsc::channel(8);

        let client = async {
            for line in ["assign top-left=0x10", "", "watch top-left", "enable"] {
                tx.send(line.to_string()).await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(system.window(NOTES).rect.origin(), Point::new(100, -302));

            let status = handle.status().await.unwrap();
            assert_eq!(status.watched, Some(EdgeSegment::TopLeft));
            assert_eq!(status.phase, TriggerPhase::Idle);

            tx.send("quit".to_string()).await.unwrap();
        };
        let console = async {
            serve(&handle, lines, pending::<io::Result<&'static str>>(), options())
                .await
                .unwrap();
        };

        tokio::join!(session.run(), client, console);

        let window = system.window(NOTES);
        assert_eq!(window.rect, NOTES_RECT);
        assert!(window.style.contains(ExStyle::APPWINDOW));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_signal_restores_windows() {
        let system = system();
        let (mut session, handle) = Session::new(&system, &TriggerConfig::default());
        let (_tx, lines) = mpsc::channel(8);

        let console = async {
            handle
                .assign(EdgeSegment::BottomLeft, NOTES, options())
                .await
                .unwrap();
            handle.enable().await.unwrap();

            let signal = async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, io::Error>("SIGTERM")
            };
            serve(&handle, lines, signal, options()).await.unwrap();
        };

        tokio::join!(session.run(), console);

        let window = system.window(NOTES);
        assert_eq!(window.rect, NOTES_RECT);
        assert!(!window.style.contains(ExStyle::TOOLWINDOW));
        assert_eq!(session.status().phase, TriggerPhase::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_reports_command_errors() {
        let system = system();
        let (mut session, handle) = Session::new(&system, &TriggerConfig::default());

        let client = async {
            let unassign = ConsoleCommand::Unassign(EdgeSegment::TopLeft, NOTES);
            let reply = execute(&handle, unassign, options()).await.unwrap();
            assert_eq!(reply, "0x10 is not assigned to top-left");

            let result = execute(&handle, ConsoleCommand::Enable, options()).await;
            assert!(matches!(result, Err(SessionError::Trigger(_))));

            let assign = ConsoleCommand::Assign(EdgeSegment::TopLeft, NOTES);
            let reply = execute(&handle, assign, options()).await.unwrap();
            assert_eq!(reply, "Assigned 0x10 to top-left");
            handle.shutdown().await.unwrap();
        };

        tokio::join!(session.run(), client);
        assert_eq!(system.window(NOTES).rect, NOTES_RECT);
    }
}
