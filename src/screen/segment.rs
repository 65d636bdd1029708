//! Edge segments and slide directions
//!
//! The screen border is split into eight hot segments, two per physical
//! edge. Every segment slides its windows out through the edge it lives on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The edge a window slides through when it is hidden or shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SlideDirection {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl fmt::Display for SlideDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlideDirection::Left => "left",
            SlideDirection::Right => "right",
            SlideDirection::Top => "top",
            SlideDirection::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// One of the eight hot zones along the screen border, in clockwise order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum EdgeSegment {
    TopLeft = 0,
    TopRight = 1,
    RightTop = 2,
    RightBottom = 3,
    BottomRight = 4,
    BottomLeft = 5,
    LeftBottom = 6,
    LeftTop = 7,
}

impl EdgeSegment {
    pub const ALL: [EdgeSegment; 8] = [
        EdgeSegment::TopLeft,
        EdgeSegment::TopRight,
        EdgeSegment::RightTop,
        EdgeSegment::RightBottom,
        EdgeSegment::BottomRight,
        EdgeSegment::BottomLeft,
        EdgeSegment::LeftBottom,
        EdgeSegment::LeftTop,
    ];

    /// Direction windows assigned to this segment travel in
    pub fn direction(self) -> SlideDirection {
        match self {
            EdgeSegment::TopLeft | EdgeSegment::TopRight => SlideDirection::Top,
            EdgeSegment::RightTop | EdgeSegment::RightBottom => SlideDirection::Right,
            EdgeSegment::BottomRight | EdgeSegment::BottomLeft => SlideDirection::Bottom,
            EdgeSegment::LeftBottom | EdgeSegment::LeftTop => SlideDirection::Left,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            EdgeSegment::TopLeft => "top-left",
            EdgeSegment::TopRight => "top-right",
            EdgeSegment::RightTop => "right-top",
            EdgeSegment::RightBottom => "right-bottom",
            EdgeSegment::BottomRight => "bottom-right",
            EdgeSegment::BottomLeft => "bottom-left",
            EdgeSegment::LeftBottom => "left-bottom",
            EdgeSegment::LeftTop => "left-top",
        }
    }
}

impl fmt::Display for EdgeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown edge segment '{0}' (expected one of: top-left, top-right, right-top, right-bottom, bottom-right, bottom-left, left-bottom, left-top)")]
pub struct ParseSegmentError(pub String);

impl FromStr for EdgeSegment {
    type Err = ParseSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        EdgeSegment::ALL
            .into_iter()
            .find(|segment| segment.name() == normalized || segment.name().replace('-', "") == normalized)
            .ok_or_else(|| ParseSegmentError(s.to_string()))
    }
}
