//! Screen management module
//!
//! Handles:
//! - Edge segments and the direction each one slides in
//! - Cursor hit testing against the segments
//! - Off-screen parking positions for hidden windows

mod edge_detector;
mod geometry;
mod placement;
mod segment;

pub use edge_detector::{EdgeDetectResult, EdgeDetector, EdgeDetectorConfig};
pub use geometry::{Point, Rect};
pub use placement::{slide_path, DEFAULT_OFFSCREEN_PADDING};
pub use segment::{EdgeSegment, ParseSegmentError};
