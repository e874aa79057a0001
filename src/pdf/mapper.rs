//! Image-space to page-space coordinate mapping.

use crate::model::{PlacementSpec, TextRegion};

/// Maps OCR quads (top-left origin) to text placements (bottom-left origin).
///
/// One page unit equals one source pixel, so only the y axis flips. The
/// glyph run starts at the region's top-left x and sits on its bottom edge;
/// the font size is the region height shrunk by `shrink_factor` so the
/// invisible glyphs stay inside the visible text they cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    /// Ratio of font size to region height
    pub shrink_factor: f32,

    /// Smallest font size emitted; degenerate regions are clamped to it
    pub min_font_size: f32,
}

impl CoordinateMapper {
    /// Create a mapper with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the height-to-font-size ratio.
    pub fn with_shrink_factor(mut self, factor: f32) -> Self {
        self.shrink_factor = factor;
        self
    }

    /// Set the minimum font size.
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.min_font_size = size;
        self
    }

    /// Compute the placement of `region` on a page `page_height` units tall.
    pub fn map(&self, region: &TextRegion, page_height: f32) -> PlacementSpec {
        let top_left = region.quad.top_left();
        let bottom_right = region.quad.bottom_right();

        let x = top_left.x;
        let y = page_height - bottom_right.y;
        let size = (bottom_right.y - top_left.y) * self.shrink_factor;

        if size.is_finite() && size > 0.0 && size >= self.min_font_size {
            PlacementSpec::new(x, y, size)
        } else {
            log::debug!(
                "Clamped font size {} to {} for region {:?}",
                size,
                self.min_font_size,
                region.text
            );
            PlacementSpec {
                x,
                y,
                font_size: self.min_font_size,
                clamped: true,
            }
        }
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            shrink_factor: 0.9,
            min_font_size: 1.0,
        }
    }
}
