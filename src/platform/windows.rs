//! Win32 window system
//!
//! Uses SetWindowPos for movement and z-order, the GWL_EXSTYLE bits for
//! taskbar visibility and layering, and SetLayeredWindowAttributes for fades.
//!
//! Notes:
//! - SetForegroundWindow is refused unless the calling process is allowed to
//!   steal focus; callers treat it as best-effort

#![cfg(target_os = "windows")]

use windows::Win32::Foundation::{BOOL, COLORREF, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MonitorFromWindow, MONITORINFO, MONITOR_DEFAULTTONEAREST,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use super::traits::{
    ExStyle, PlatformError, PlatformResult, WindowHandle, WindowInfo, WindowSystem,
};
use crate::screen::{Point, Rect};

/// Window classes that belong to the shell and are never offered
const SHELL_CLASSES: [&str; 3] = ["Progman", "Shell_TrayWnd", "Windows.UI.Core.CoreWindow"];

/// Windows smaller than this are not worth offering
const MIN_WIDTH: i32 = 100;
const MIN_HEIGHT: i32 = 40;

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0)
}

fn os_error(op: &'static str, err: windows::core::Error) -> PlatformError {
    PlatformError::Os {
        op,
        message: err.to_string(),
    }
}

fn rect_from(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

/// Win32 implementation of [`WindowSystem`]
#[derive(Debug, Default)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }

    /// Fail with `StaleHandle` once the window is gone, so callers can prune it
    fn live(&self, handle: WindowHandle) -> PlatformResult<HWND> {
        if self.is_window(handle) {
            Ok(hwnd(handle))
        } else {
            Err(PlatformError::StaleHandle(handle))
        }
    }

    fn set_pos(
        &self,
        handle: WindowHandle,
        insert_after: HWND,
        at: Point,
        flags: SET_WINDOW_POS_FLAGS,
        op: &'static str,
    ) -> PlatformResult<()> {
        let hwnd = self.live(handle)?;
        unsafe { SetWindowPos(hwnd, insert_after, at.x, at.y, 0, 0, flags) }
            .map_err(|e| os_error(op, e))
    }
}

impl WindowSystem for Win32WindowSystem {
    fn is_window(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindow(hwnd(handle)).as_bool() }
    }

    fn window_rect(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        let hwnd = self.live(handle)?;
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(|e| os_error("GetWindowRect", e))?;
        Ok(rect_from(rect))
    }

    fn move_window(&self, handle: WindowHandle, to: Point) -> PlatformResult<()> {
        self.set_pos(
            handle,
            HWND(0),
            to,
            SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            "SetWindowPos",
        )
    }

    fn set_topmost(&self, handle: WindowHandle, at: Point) -> PlatformResult<()> {
        // Topmost keeps the window above full-screen applications too
        self.set_pos(
            handle,
            HWND_TOPMOST,
            at,
            SWP_NOSIZE | SWP_NOACTIVATE,
            "SetWindowPos(HWND_TOPMOST)",
        )
    }

    fn clear_topmost(&self, handle: WindowHandle) -> PlatformResult<()> {
        self.set_pos(
            handle,
            HWND_NOTOPMOST,
            Point::default(),
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            "SetWindowPos(HWND_NOTOPMOST)",
        )
    }

    fn extended_style(&self, handle: WindowHandle) -> PlatformResult<ExStyle> {
        let hwnd = self.live(handle)?;
        let style = unsafe { GetWindowLongW(hwnd, GWL_EXSTYLE) };
        Ok(ExStyle(style as u32))
    }

    fn set_extended_style(&self, handle: WindowHandle, style: ExStyle) -> PlatformResult<()> {
        let hwnd = self.live(handle)?;
        unsafe {
            SetWindowLongW(hwnd, GWL_EXSTYLE, style.0 as i32);
        }
        // The taskbar only notices style changes after a frame change
        self.set_pos(
            handle,
            HWND(0),
            Point::default(),
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            "SetWindowPos(SWP_FRAMECHANGED)",
        )
    }

    fn set_opacity(&self, handle: WindowHandle, alpha: u8) -> PlatformResult<()> {
        let hwnd = self.live(handle)?;
        unsafe { SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA) }
            .map_err(|e| os_error("SetLayeredWindowAttributes", e))
    }

    fn monitor_bounds(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        let hwnd = self.live(handle)?;
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        let ok = unsafe {
            let monitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
            GetMonitorInfoW(monitor, &mut info)
        };
        if !ok.as_bool() {
            return Err(PlatformError::Os {
                op: "GetMonitorInfoW",
                message: format!("no monitor information for window {}", handle),
            });
        }
        Ok(rect_from(info.rcMonitor))
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0 == 0 {
            None
        } else {
            Some(WindowHandle(hwnd.0))
        }
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        unsafe { SetForegroundWindow(hwnd(handle)).as_bool() }
    }

    fn cursor_position(&self) -> PlatformResult<Point> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.map_err(|e| os_error("GetCursorPos", e))?;
        Ok(Point::new(point.x, point.y))
    }

    fn screen_size(&self) -> (u32, u32) {
        let (width, height) =
            unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn visible_windows(&self) -> PlatformResult<Vec<WindowInfo>> {
        let mut found: Vec<WindowInfo> = Vec::new();
        unsafe {
            EnumWindows(
                Some(collect_window),
                LPARAM(&mut found as *mut Vec<WindowInfo> as isize),
            )
        }
        .map_err(|e| os_error("EnumWindows", e))?;
        Ok(found)
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let found = &mut *(lparam.0 as *mut Vec<WindowInfo>);
    if let Some(info) = candidate_window(hwnd) {
        found.push(info);
    }
    TRUE
}

unsafe fn candidate_window(hwnd: HWND) -> Option<WindowInfo> {
    if !IsWindowVisible(hwnd).as_bool() {
        return None;
    }

    // Top-level only
    if GetParent(hwnd).0 != 0 {
        return None;
    }

    let mut class = [0u16; 256];
    let len = GetClassNameW(hwnd, &mut class);
    let class = String::from_utf16_lossy(&class[..len.max(0) as usize]);
    if SHELL_CLASSES.contains(&class.as_str()) {
        return None;
    }

    let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
    if style & WS_CAPTION.0 == 0 || style & WS_SYSMENU.0 == 0 {
        return None;
    }

    let mut rect = RECT::default();
    GetWindowRect(hwnd, &mut rect).ok()?;
    let rect = rect_from(rect);
    if rect.width() < MIN_WIDTH || rect.height() < MIN_HEIGHT {
        return None;
    }

    let mut title = [0u16; 512];
    let len = GetWindowTextW(hwnd, &mut title);
    if len <= 0 {
        return None;
    }

    Some(WindowInfo {
        handle: WindowHandle(hwnd.0),
        title: String::from_utf16_lossy(&title[..len as usize]),
        rect,
    })
}
