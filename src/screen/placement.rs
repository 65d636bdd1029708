//! Off-screen placement
//!
//! Computes where a window parks while hidden, relative to the monitor it
//! lives on.

use super::geometry::{Point, Rect};
use super::segment::SlideDirection;

/// Default gap between a parked window and the monitor edge
pub const DEFAULT_OFFSCREEN_PADDING: i32 = 2;

/// The two ends of a slide: parked off-screen and visible at its original spot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidePath {
    pub hidden: Point,
    pub shown: Point,
}

impl SlidePath {
    /// Start and end of the slide for the given travel direction
    pub fn endpoints(&self, revealing: bool) -> (Point, Point) {
        if revealing {
            (self.hidden, self.shown)
        } else {
            (self.shown, self.hidden)
        }
    }
}

/// Compute the hidden and shown positions for a window.
///
/// `original` is the rectangle captured when the window was assigned and
/// `monitor` the bounds of the monitor nearest to it. The window keeps its
/// other coordinate while parked.
pub fn slide_path(
    direction: SlideDirection,
    original: Rect,
    monitor: Rect,
    padding: i32,
) -> SlidePath {
    let width = original.width();
    let height = original.height();
    let shown = original.origin();

    let hidden = match direction {
        SlideDirection::Left => Point::new(monitor.left - width - padding, original.top),
        SlideDirection::Right => Point::new(monitor.right + padding, original.top),
        SlideDirection::Top => Point::new(original.left, monitor.top - height - padding),
        SlideDirection::Bottom => Point::new(original.left, monitor.bottom + padding),
    };

    SlidePath { hidden, shown }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR: Rect = Rect::new(0, 0, 1920, 1080);
    const WINDOW: Rect = Rect::new(100, 100, 500, 400);

    #[test]
    fn test_hidden_positions() {
        let p = DEFAULT_OFFSCREEN_PADDING;

        let left = slide_path(SlideDirection::Left, WINDOW, MONITOR, p);
        assert_eq!(left.hidden, Point::new(-402, 100));

        let right = slide_path(SlideDirection::Right, WINDOW, MONITOR, p);
        assert_eq!(right.hidden, Point::new(1922, 100));

        let top = slide_path(SlideDirection::Top, WINDOW, MONITOR, p);
        assert_eq!(top.hidden, Point::new(100, -302));

        let bottom = slide_path(SlideDirection::Bottom, WINDOW, MONITOR, p);
        assert_eq!(bottom.hidden, Point::new(100, 1082));

        for path in [left, right, top, bottom] {
            assert_eq!(path.shown, Point::new(100, 100));
        }
    }

    #[test]
    fn test_secondary_monitor() {
        let monitor = Rect::new(1920, -200, 4480, 1240);
        let window = Rect::new(2000, 0, 2800, 600);

        let path = slide_path(SlideDirection::Top, window, monitor, 2);
        assert_eq!(path.hidden, Point::new(2000, -802));

        let path = slide_path(SlideDirection::Left, window, monitor, 2);
        assert_eq!(path.hidden, Point::new(1118, 0));
    }

    #[test]
    fn test_endpoints_follow_travel_direction() {
        let path = slide_path(SlideDirection::Top, WINDOW, MONITOR, 2);
        assert_eq!(path.endpoints(true), (path.hidden, path.shown));
        assert_eq!(path.endpoints(false), (path.shown, path.hidden));
    }
}
