//! OCR text regions in image space.

use serde::{Deserialize, Serialize};

/// A point in image space (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Four corners of a detected region, ordered top-left, top-right,
/// bottom-right, bottom-left.
///
/// The corners need not be axis-aligned. Placement only looks at corners 0
/// and 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Build a quad from points in OCR order. Returns `None` for fewer than
    /// four points or any non-finite coordinate; extra points are ignored.
    pub fn from_points(points: &[(f32, f32)]) -> Option<Self> {
        if points.len() < 4 {
            return None;
        }
        let corners = [
            Point::new(points[0].0, points[0].1),
            Point::new(points[1].0, points[1].1),
            Point::new(points[2].0, points[2].1),
            Point::new(points[3].0, points[3].1),
        ];
        if corners.iter().all(Point::is_finite) {
            Some(Self(corners))
        } else {
            None
        }
    }

    /// Axis-aligned quad from a left/top/width/height box.
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        let right = left + width;
        let bottom = top + height;
        Self([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[2]
    }

    /// Vertical extent between corners 0 and 2; negative for flipped or
    /// rotated regions.
    pub fn height(&self) -> f32 {
        self.0[2].y - self.0[0].y
    }

    pub fn width(&self) -> f32 {
        self.0[2].x - self.0[0].x
    }
}

/// A recognized text fragment that passed validation and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Index of the image this region belongs to
    pub image_index: usize,

    /// Region outline in image space
    pub quad: Quad,

    /// Recognized text
    pub text: String,

    /// Engine confidence in [0, 1]
    pub confidence: f32,
}

impl TextRegion {
    /// Create a new region.
    pub fn new(image_index: usize, quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            image_index,
            quad,
            text: text.into(),
            confidence,
        }
    }
}
