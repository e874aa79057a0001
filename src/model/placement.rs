//! Page-space placement of a text region.

use serde::{Deserialize, Serialize};

/// Where and how large a region's text is drawn on the page.
///
/// Coordinates are in page space: origin bottom-left, y grows upward,
/// one unit per source pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Baseline origin x
    pub x: f32,

    /// Baseline origin y
    pub y: f32,

    /// Font size in page units
    pub font_size: f32,

    /// Whether the font size was clamped because the region was degenerate
    pub clamped: bool,
}

impl PlacementSpec {
    /// Create an unclamped placement.
    pub fn new(x: f32, y: f32, font_size: f32) -> Self {
        Self {
            x,
            y,
            font_size,
            clamped: false,
        }
    }
}
