//! Window system trait definitions
//!
//! Defines the interface that platform-specific implementations must provide.
//! Every call is expected to return promptly; nothing here blocks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::screen::{Point, Rect};

/// Opaque native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => isize::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(WindowHandle(value))
    }
}

/// Extended window style bits relevant to sliding windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExStyle(pub u32);

impl ExStyle {
    /// Always-on-top, set through the z-order rather than the style word
    pub const TOPMOST: ExStyle = ExStyle(0x0000_0008);
    /// Tool windows never get a taskbar button
    pub const TOOLWINDOW: ExStyle = ExStyle(0x0000_0080);
    /// Forces a taskbar button for top-level windows
    pub const APPWINDOW: ExStyle = ExStyle(0x0004_0000);
    /// Whole-window alpha transparency
    pub const LAYERED: ExStyle = ExStyle(0x0008_0000);

    pub fn contains(self, other: ExStyle) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: ExStyle) -> ExStyle {
        ExStyle(self.0 | other.0)
    }

    pub fn without(self, other: ExStyle) -> ExStyle {
        ExStyle(self.0 & !other.0)
    }

    /// Style with the taskbar button removed
    pub fn hidden_from_taskbar(self) -> ExStyle {
        self.without(ExStyle::APPWINDOW).with(ExStyle::TOOLWINDOW)
    }

    /// Style with the taskbar button restored
    pub fn shown_in_taskbar(self) -> ExStyle {
        self.with(ExStyle::APPWINDOW).without(ExStyle::TOOLWINDOW)
    }
}

/// A candidate window for assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub rect: Rect,
}

/// Errors that can occur during window system calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Window {0} no longer exists")]
    StaleHandle(WindowHandle),

    #[error("{op} failed: {message}")]
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    Os { op: &'static str, message: String },
}

impl PlatformError {
    /// Whether the error means the window is gone for good
    pub fn is_stale(&self) -> bool {
        matches!(self, PlatformError::StaleHandle(_))
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Geometry and window-state access for the host window system.
///
/// Methods take `&self`; the mutation happens on the OS side.
pub trait WindowSystem {
    /// Whether the handle still names a live window
    fn is_window(&self, handle: WindowHandle) -> bool;

    /// Current outer rectangle of the window
    fn window_rect(&self, handle: WindowHandle) -> PlatformResult<Rect>;

    /// Move the window keeping its size and z-order, without activating it
    fn move_window(&self, handle: WindowHandle, to: Point) -> PlatformResult<()>;

    /// Move the window and place it above all non-topmost windows
    fn set_topmost(&self, handle: WindowHandle, at: Point) -> PlatformResult<()>;

    /// Drop the always-on-top placement without moving the window
    fn clear_topmost(&self, handle: WindowHandle) -> PlatformResult<()>;

    fn extended_style(&self, handle: WindowHandle) -> PlatformResult<ExStyle>;

    /// Replace the extended style and let the frame pick up the change
    fn set_extended_style(&self, handle: WindowHandle, style: ExStyle) -> PlatformResult<()>;

    /// Set whole-window opacity; the window must already be layered
    fn set_opacity(&self, handle: WindowHandle, alpha: u8) -> PlatformResult<()>;

    /// Bounds of the monitor nearest to the window
    fn monitor_bounds(&self, handle: WindowHandle) -> PlatformResult<Rect>;

    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Best-effort; returns false when the OS refuses
    fn set_foreground_window(&self, handle: WindowHandle) -> bool;

    fn cursor_position(&self) -> PlatformResult<Point>;

    /// Size of the primary screen
    fn screen_size(&self) -> (u32, u32);

    /// Visible, captioned top-level windows worth offering for assignment.
    /// Each call enumerates afresh.
    fn visible_windows(&self) -> PlatformResult<Vec<WindowInfo>>;

    /// Add the layered style so opacity can be animated
    fn make_layered(&self, handle: WindowHandle) -> PlatformResult<()> {
        let style = self.extended_style(handle)?;
        if style.contains(ExStyle::LAYERED) {
            return Ok(());
        }
        self.set_extended_style(handle, style.with(ExStyle::LAYERED))
    }

    /// Toggle the window's taskbar button via its extended style
    fn set_taskbar_visible(&self, handle: WindowHandle, visible: bool) -> PlatformResult<()> {
        let style = self.extended_style(handle)?;
        let style = if visible {
            style.shown_in_taskbar()
        } else {
            style.hidden_from_taskbar()
        };
        self.set_extended_style(handle, style)
    }
}

impl<T: WindowSystem + ?Sized> WindowSystem for &T {
    fn is_window(&self, handle: WindowHandle) -> bool {
        (**self).is_window(handle)
    }

    fn window_rect(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        (**self).window_rect(handle)
    }

    fn move_window(&self, handle: WindowHandle, to: Point) -> PlatformResult<()> {
        (**self).move_window(handle, to)
    }

    fn set_topmost(&self, handle: WindowHandle, at: Point) -> PlatformResult<()> {
        (**self).set_topmost(handle, at)
    }

    fn clear_topmost(&self, handle: WindowHandle) -> PlatformResult<()> {
        (**self).clear_topmost(handle)
    }

    fn extended_style(&self, handle: WindowHandle) -> PlatformResult<ExStyle> {
        (**self).extended_style(handle)
    }

    fn set_extended_style(&self, handle: WindowHandle, style: ExStyle) -> PlatformResult<()> {
        (**self).set_extended_style(handle, style)
    }

    fn set_opacity(&self, handle: WindowHandle, alpha: u8) -> PlatformResult<()> {
        (**self).set_opacity(handle, alpha)
    }

    fn monitor_bounds(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        (**self).monitor_bounds(handle)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        (**self).foreground_window()
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        (**self).set_foreground_window(handle)
    }

    fn cursor_position(&self) -> PlatformResult<Point> {
        (**self).cursor_position()
    }

    fn screen_size(&self) -> (u32, u32) {
        (**self).screen_size()
    }

    fn visible_windows(&self) -> PlatformResult<Vec<WindowInfo>> {
        (**self).visible_windows()
    }
}
