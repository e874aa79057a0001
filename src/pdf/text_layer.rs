//! Invisible text layer drawing.

use serde::{Deserialize, Serialize};

use super::canvas::Canvas;
use super::font::FontResource;
use crate::error::Result;
use crate::model::PlacementSpec;

/// How glyphs are kept invisible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// White fill at zero opacity
    #[default]
    TransparentFill,
    /// Text render mode 3 (neither fill nor stroke)
    Invisible,
}

/// Draws one glyph run per text region.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayerRenderer {
    mode: TextMode,
}

impl TextLayerRenderer {
    /// Create a renderer.
    pub fn new(mode: TextMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TextMode {
        self.mode
    }

    /// Draw `text` at `placement`. Fill opacity is back to its previous
    /// value when this returns.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        placement: &PlacementSpec,
        text: &str,
        font: &mut FontResource,
    ) -> Result<()> {
        canvas.save_state();
        if self.mode == TextMode::TransparentFill {
            canvas.set_fill_alpha(0.0);
            canvas.set_fill_rgb(1.0, 1.0, 1.0);
        }

        canvas.begin_text()?;
        canvas.set_font(placement.font_size);
        if self.mode == TextMode::Invisible {
            canvas.set_text_render_mode(3);
        }
        canvas.move_text(placement.x, placement.y);
        canvas.show_text(font.encode(text));
        canvas.end_text()?;

        canvas.restore_state()?;
        canvas.record_text(text);
        if placement.clamped {
            canvas.note_clamped();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(canvas: Canvas) -> Vec<String> {
        canvas
            .finish()
            .unwrap()
            .operations()
            .iter()
            .map(|op| op.operator.clone())
            .collect()
    }

    #[test]
    fn test_alpha_restored_after_each_region() {
        let mut canvas = Canvas::new(200, 200);
        let mut font = FontResource::builtin();
        let renderer = TextLayerRenderer::default();

        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let placement = PlacementSpec::new(10.0, 20.0 * i as f32, 12.0);
            renderer.draw(&mut canvas, &placement, text, &mut font).unwrap();
            assert_eq!(canvas.fill_alpha(), 1.0);
            assert_eq!(canvas.state_depth(), 0);
        }

        let page = canvas.finish().unwrap();
        assert_eq!(page.texts(), &["one", "two", "three"]);
        assert_eq!(page.alpha_states().len(), 1);
    }

    #[test]
    fn test_transparent_fill_sequence() {
        let mut canvas = Canvas::new(100, 100);
        let mut font = FontResource::builtin();
        TextLayerRenderer::default()
            .draw(&mut canvas, &PlacementSpec::new(1.0, 2.0, 9.0), "x", &mut font)
            .unwrap();
        assert_eq!(
            ops(canvas),
            vec!["q", "gs", "rg", "BT", "Tf", "Td", "Tj", "ET", "Q"]
        );
    }

    #[test]
    fn test_invisible_mode_sequence() {
        let mut canvas = Canvas::new(100, 100);
        let mut font = FontResource::builtin();
        TextLayerRenderer::new(TextMode::Invisible)
            .draw(&mut canvas, &PlacementSpec::new(1.0, 2.0, 9.0), "x", &mut font)
            .unwrap();
        assert_eq!(ops(canvas), vec!["q", "BT", "Tf", "Tr", "Td", "Tj", "ET", "Q"]);
    }

    #[test]
    fn test_clamped_placements_are_counted() {
        let mut canvas = Canvas::new(100, 100);
        let mut font = FontResource::builtin();
        let placement = PlacementSpec {
            x: 0.0,
            y: 0.0,
            font_size: 1.0,
            clamped: true,
        };
        TextLayerRenderer::default()
            .draw(&mut canvas, &placement, "flat", &mut font)
            .unwrap();
        assert_eq!(canvas.finish().unwrap().clamped(), 1);
    }
}
