//! Screen edge detection
//!
//! Maps the cursor position onto one of the eight edge segments and decides
//! whether the cursor has rested there long enough to count as a hit.

use std::time::Duration;

use tokio::time::Instant;

use super::segment::EdgeSegment;

/// Configuration for edge detection
#[derive(Debug, Clone)]
pub struct EdgeDetectorConfig {
    /// Margin in pixels from the screen edge to trigger detection
    pub edge_margin: u32,
    /// Minimum time cursor must stay in a segment before it counts (ms)
    pub dwell_time_ms: u64,
}

impl Default for EdgeDetectorConfig {
    fn default() -> Self {
        Self {
            edge_margin: 3,
            dwell_time_ms: 0, // Instant hit
        }
    }
}

/// Result of edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDetectResult {
    /// Cursor is not at any edge
    NotAtEdge,
    /// Cursor is in a segment but waiting for dwell time
    Dwelling {
        segment: EdgeSegment,
        remaining_ms: u64,
    },
    /// Cursor is in a segment and the hit counts
    Hit { segment: EdgeSegment },
}

/// Which segment, if any, the point `(x, y)` falls into.
///
/// Edges are tested top, bottom, left, right; the first match wins, so the
/// corners belong to the top and bottom edges.
///
/// `width` and `height` are the primary screen's, while cursor coordinates
/// span the whole virtual desktop. With more than one monitor, any point on a
/// monitor right of or below the primary counts as a right or bottom edge
/// hit, and any point left of or above it as a left or top edge hit.
pub fn hit_segment(x: i32, y: i32, width: u32, height: u32, margin: u32) -> Option<EdgeSegment> {
    let width = width as i32;
    let height = height as i32;
    let margin = margin as i32;
    let mid_x = width / 2;
    let mid_y = height / 2;

    if y <= margin {
        Some(if x <= mid_x {
            EdgeSegment::TopLeft
        } else {
            EdgeSegment::TopRight
        })
    } else if y >= height - margin {
        Some(if x <= mid_x {
            EdgeSegment::BottomLeft
        } else {
            EdgeSegment::BottomRight
        })
    } else if x <= margin {
        Some(if y <= mid_y {
            EdgeSegment::LeftTop
        } else {
            EdgeSegment::LeftBottom
        })
    } else if x >= width - margin {
        Some(if y <= mid_y {
            EdgeSegment::RightTop
        } else {
            EdgeSegment::RightBottom
        })
    } else {
        None
    }
}

/// Detects cursor hits on edge segments
#[derive(Debug)]
pub struct EdgeDetector {
    /// Configuration
    config: EdgeDetectorConfig,
    /// Screen dimensions
    screen_width: u32,
    screen_height: u32,
    /// Segment the cursor is currently in and when it got there
    current: Option<(EdgeSegment, Instant)>,
}

impl EdgeDetector {
    /// Create a new edge detector
    pub fn new(config: EdgeDetectorConfig, screen_width: u32, screen_height: u32) -> Self {
        Self {
            config,
            screen_width,
            screen_height,
            current: None,
        }
    }

    /// Update screen dimensions
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        if (width, height) != (self.screen_width, self.screen_height) {
            tracing::debug!("Screen size changed to {}x{}", width, height);
        }
        self.screen_width = width;
        self.screen_height = height;
    }

    /// Check cursor position at `now`
    pub fn check(&mut self, x: i32, y: i32, now: Instant) -> EdgeDetectResult {
        let detected = hit_segment(
            x,
            y,
            self.screen_width,
            self.screen_height,
            self.config.edge_margin,
        );

        let Some(segment) = detected else {
            self.current = None;
            return EdgeDetectResult::NotAtEdge;
        };

        // Moving between segments restarts the dwell
        let since = match self.current {
            Some((current, since)) if current == segment => since,
            _ => {
                self.current = Some((segment, now));
                now
            }
        };

        let dwell = Duration::from_millis(self.config.dwell_time_ms);
        let elapsed = now.saturating_duration_since(since);
        if elapsed >= dwell {
            EdgeDetectResult::Hit { segment }
        } else {
            EdgeDetectResult::Dwelling {
                segment,
                remaining_ms: (dwell - elapsed).as_millis() as u64,
            }
        }
    }

    /// Reset dwell tracking
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_regions() {
        let hit = |x, y| hit_segment(x, y, 1920, 1080, 3);

        assert_eq!(hit(10, 0), Some(EdgeSegment::TopLeft));
        assert_eq!(hit(960, 3), Some(EdgeSegment::TopLeft));
        assert_eq!(hit(961, 2), Some(EdgeSegment::TopRight));
        assert_eq!(hit(100, 1079), Some(EdgeSegment::BottomLeft));
        assert_eq!(hit(1500, 1077), Some(EdgeSegment::BottomRight));
        assert_eq!(hit(0, 200), Some(EdgeSegment::LeftTop));
        assert_eq!(hit(2, 900), Some(EdgeSegment::LeftBottom));
        assert_eq!(hit(1919, 540), Some(EdgeSegment::RightTop));
        assert_eq!(hit(1917, 541), Some(EdgeSegment::RightBottom));
        assert_eq!(hit(500, 500), None);
        assert_eq!(hit(4, 4), None);
    }

    #[test]
    fn test_corners_belong_to_horizontal_edges() {
        assert_eq!(hit_segment(0, 0, 1920, 1080, 3), Some(EdgeSegment::TopLeft));
        assert_eq!(hit_segment(1919, 0, 1920, 1080, 3), Some(EdgeSegment::TopRight));
        assert_eq!(hit_segment(0, 1079, 1920, 1080, 3), Some(EdgeSegment::BottomLeft));
        assert_eq!(hit_segment(1919, 1079, 1920, 1080, 3), Some(EdgeSegment::BottomRight));
    }

    #[test]
    fn test_instant_hit() {
        let mut detector = EdgeDetector::new(EdgeDetectorConfig::default(), 1920, 1080);
        let now = Instant::now();

        assert_eq!(
            detector.check(100, 0, now),
            EdgeDetectResult::Hit {
                segment: EdgeSegment::TopLeft
            }
        );
        assert_eq!(detector.check(500, 500, now), EdgeDetectResult::NotAtEdge);
    }

    #[test]
    fn test_dwell_time() {
        let config = EdgeDetectorConfig {
            dwell_time_ms: 100,
            ..Default::default()
        };
        let mut detector = EdgeDetector::new(config, 1920, 1080);
        let start = Instant::now();

        let result = detector.check(0, 200, start);
        assert_eq!(
            result,
            EdgeDetectResult::Dwelling {
                segment: EdgeSegment::LeftTop,
                remaining_ms: 100
            }
        );

        // Switching segment restarts the clock
        let later = start + Duration::from_millis(60);
        assert!(matches!(
            detector.check(0, 900, later),
            EdgeDetectResult::Dwelling {
                segment: EdgeSegment::LeftBottom,
                remaining_ms: 100
            }
        ));

        let result = detector.check(0, 900, later + Duration::from_millis(100));
        assert_eq!(
            result,
            EdgeDetectResult::Hit {
                segment: EdgeSegment::LeftBottom
            }
        );

        // Resetting forgets the dwell already done
        detector.reset();
        assert!(matches!(
            detector.check(0, 900, later + Duration::from_millis(150)),
            EdgeDetectResult::Dwelling { remaining_ms: 100, .. }
        ));
    }

    #[test]
    fn test_cursor_on_other_monitors() {
        // Primary is 1920x1080; a second monitor sits to its right and a
        // third to its left
        let hit = |x, y| hit_segment(x, y, 1920, 1080, 3);

        assert_eq!(hit(2500, 200), Some(EdgeSegment::RightTop));
        assert_eq!(hit(3000, 900), Some(EdgeSegment::RightBottom));
        assert_eq!(hit(2500, 1200), Some(EdgeSegment::BottomRight));
        assert_eq!(hit(-800, 700), Some(EdgeSegment::LeftBottom));
        assert_eq!(hit(-800, -10), Some(EdgeSegment::TopLeft));
    }

    #[test]
    fn test_screen_resize() {
        let mut detector = EdgeDetector::new(EdgeDetectorConfig::default(), 1920, 1080);
        let now = Instant::now();
        assert_eq!(detector.check(2559, 700, now), EdgeDetectResult::Hit {
            segment: EdgeSegment::RightBottom
        });

        detector.set_screen_size(2560, 1440);
        assert_eq!(detector.check(1919, 700, now), EdgeDetectResult::NotAtEdge);
        assert_eq!(detector.check(2559, 700, now), EdgeDetectResult::Hit {
            segment: EdgeSegment::RightTop
        });
    }
}
