//! In-memory window system used by the tests
//!
//! Records every write so tests can assert on the exact sequence of
//! positions, opacities and style changes a window went through.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::traits::{
    ExStyle, PlatformError, PlatformResult, WindowHandle, WindowInfo, WindowSystem,
};
use crate::screen::{Point, Rect};

/// State of one fake window
#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub title: String,
    pub rect: Rect,
    pub style: ExStyle,
    pub alpha: Option<u8>,
    pub topmost: bool,
    /// Every position written, in order
    pub moves: Vec<Point>,
    /// Every opacity written, in order
    pub alphas: Vec<u8>,
}

#[derive(Debug)]
pub struct FakeWindowSystem {
    windows: RefCell<HashMap<WindowHandle, FakeWindow>>,
    monitor: Rect,
    foreground: Cell<Option<WindowHandle>>,
    cursor: Cell<Point>,
    refuse_foreground: Cell<bool>,
    foreground_requests: RefCell<Vec<WindowHandle>>,
}

impl FakeWindowSystem {
    /// A single 1920x1080 monitor with the cursor in the middle
    pub fn new() -> Self {
        Self::with_monitor(Rect::new(0, 0, 1920, 1080))
    }

    pub fn with_monitor(monitor: Rect) -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            monitor,
            foreground: Cell::new(None),
            cursor: Cell::new(Point::new(monitor.width() / 2, monitor.height() / 2)),
            refuse_foreground: Cell::new(false),
            foreground_requests: RefCell::new(Vec::new()),
        }
    }

    /// A window that was already always-on-top before anything touched it
    pub fn add_topmost_window(&self, handle: WindowHandle, title: &str, rect: Rect) {
        self.add_window(handle, title, rect);
        let _ = self.with_window(handle, |w| w.topmost = true);
    }

    pub fn add_window(&self, handle: WindowHandle, title: &str, rect: Rect) {
        self.windows.borrow_mut().insert(
            handle,
            FakeWindow {
                title: title.to_string(),
                rect,
                style: ExStyle::APPWINDOW,
                alpha: None,
                topmost: false,
                moves: Vec::new(),
                alphas: Vec::new(),
            },
        );
    }

    /// Simulate the window being closed by its owner
    pub fn close_window(&self, handle: WindowHandle) {
        self.windows.borrow_mut().remove(&handle);
    }

    pub fn window(&self, handle: WindowHandle) -> FakeWindow {
        self.windows
            .borrow()
            .get(&handle)
            .cloned()
            .unwrap_or_else(|| panic!("no fake window {}", handle))
    }

    pub fn set_cursor(&self, x: i32, y: i32) {
        self.cursor.set(Point::new(x, y));
    }

    pub fn set_foreground(&self, handle: Option<WindowHandle>) {
        self.foreground.set(handle);
    }

    pub fn refuse_foreground(&self, refuse: bool) {
        self.refuse_foreground.set(refuse);
    }

    pub fn foreground_requests(&self) -> Vec<WindowHandle> {
        self.foreground_requests.borrow().clone()
    }

    fn with_window<T>(
        &self,
        handle: WindowHandle,
        f: impl FnOnce(&mut FakeWindow) -> T,
    ) -> PlatformResult<T> {
        let mut windows = self.windows.borrow_mut();
        let window = windows
            .get_mut(&handle)
            .ok_or(PlatformError::StaleHandle(handle))?;
        Ok(f(window))
    }
}

impl Default for FakeWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for FakeWindowSystem {
    fn is_window(&self, handle: WindowHandle) -> bool {
        self.windows.borrow().contains_key(&handle)
    }

    fn window_rect(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        self.with_window(handle, |w| w.rect)
    }

    fn move_window(&self, handle: WindowHandle, to: Point) -> PlatformResult<()> {
        self.with_window(handle, |w| {
            w.rect = w.rect.moved_to(to);
            w.moves.push(to);
        })
    }

    fn set_topmost(&self, handle: WindowHandle, at: Point) -> PlatformResult<()> {
        self.with_window(handle, |w| {
            w.rect = w.rect.moved_to(at);
            w.topmost = true;
        })
    }

    fn clear_topmost(&self, handle: WindowHandle) -> PlatformResult<()> {
        self.with_window(handle, |w| w.topmost = false)
    }

    /// Reports the topmost bit the way the OS does
    fn extended_style(&self, handle: WindowHandle) -> PlatformResult<ExStyle> {
        self.with_window(handle, |w| {
            if w.topmost {
                w.style.with(ExStyle::TOPMOST)
            } else {
                w.style
            }
        })
    }

    /// Topmost only changes through the z-order, as with `SetWindowLong`
    fn set_extended_style(&self, handle: WindowHandle, style: ExStyle) -> PlatformResult<()> {
        self.with_window(handle, |w| w.style = style.without(ExStyle::TOPMOST))
    }

    fn set_opacity(&self, handle: WindowHandle, alpha: u8) -> PlatformResult<()> {
        self.with_window(handle, |w| {
            w.alpha = Some(alpha);
            w.alphas.push(alpha);
        })
    }

    fn monitor_bounds(&self, handle: WindowHandle) -> PlatformResult<Rect> {
        self.with_window(handle, |_| self.monitor)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground.get()
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        self.foreground_requests.borrow_mut().push(handle);
        if self.refuse_foreground.get() || !self.is_window(handle) {
            return false;
        }
        self.foreground.set(Some(handle));
        true
    }

    fn cursor_position(&self) -> PlatformResult<Point> {
        Ok(self.cursor.get())
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.monitor.width() as u32, self.monitor.height() as u32)
    }

    fn visible_windows(&self) -> PlatformResult<Vec<WindowInfo>> {
        let mut windows: Vec<WindowInfo> = self
            .windows
            .borrow()
            .iter()
            .map(|(handle, w)| WindowInfo {
                handle: *handle,
                title: w.title.clone(),
                rect: w.rect,
            })
            .collect();
        windows.sort_by_key(|w| w.handle);
        Ok(windows)
    }
}
