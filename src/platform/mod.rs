//! Platform module - Window geometry and state access
//!
//! This module provides abstractions for:
//! - Reading and writing window position, z-order and extended style
//! - Opacity for fading windows
//! - Cursor, foreground window and monitor queries
//! - Enumerating candidate windows

mod traits;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(test)]
pub mod fake;

pub use traits::*;

#[cfg(target_os = "windows")]
pub use self::windows::Win32WindowSystem;

/// Get the current platform name
pub fn platform_name() -> &'static str {
    #[cfg(target_os = "macos")]
    return "macOS";

    #[cfg(target_os = "linux")]
    return "Linux";

    #[cfg(target_os = "windows")]
    return "Windows";

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    return "Unknown";
}

/// Whether windows can actually be moved on this platform
pub fn is_supported() -> bool {
    cfg!(target_os = "windows")
}
