//! Page drawing surface and the sealed page it produces.

use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

use super::xobject::ImageXObject;
use crate::error::{Error, Result};
use crate::model::PageText;

/// Resource name of the text-layer font on every page.
pub const FONT_RESOURCE: &str = "F1";

/// Resource name of the page image.
pub const IMAGE_RESOURCE: &str = "Im0";

#[derive(Debug, Clone, Copy, PartialEq)]
struct GraphicsState {
    fill_alpha: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self { fill_alpha: 1.0 }
    }
}

/// An open page being drawn.
///
/// Tracks the graphics-state stack so fill opacity changes are always
/// scoped, and collects the resources the content stream refers to.
/// [`finish`](Canvas::finish) consumes the canvas and returns a [`Page`],
/// which has no drawing methods.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    operations: Vec<Operation>,
    current: GraphicsState,
    saved: Vec<GraphicsState>,
    in_text: bool,
    alpha_states: Vec<(String, f32)>,
    image: Option<ImageXObject>,
    uses_font: bool,
    texts: Vec<String>,
    clamped: usize,
}

impl Canvas {
    /// Open a page of `width` x `height` units.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            operations: Vec::new(),
            current: GraphicsState::default(),
            saved: Vec::new(),
            in_text: false,
            alpha_states: Vec::new(),
            image: None,
            uses_font: false,
            texts: Vec::new(),
            clamped: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current fill opacity.
    pub fn fill_alpha(&self) -> f32 {
        self.current.fill_alpha
    }

    /// Depth of the graphics-state stack.
    pub fn state_depth(&self) -> usize {
        self.saved.len()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// `q`
    pub fn save_state(&mut self) {
        self.saved.push(self.current);
        self.push("q", vec![]);
    }

    /// `Q`
    pub fn restore_state(&mut self) -> Result<()> {
        let state = self
            .saved
            .pop()
            .ok_or_else(|| Error::Pdf("graphics state restored without a matching save".into()))?;
        self.current = state;
        self.push("Q", vec![]);
        Ok(())
    }

    /// Set the fill opacity through an ExtGState resource.
    pub fn set_fill_alpha(&mut self, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let name = match self.alpha_states.iter().find(|(_, a)| *a == alpha) {
            Some((name, _)) => name.clone(),
            None => {
                let name = format!("GA{}", self.alpha_states.len());
                self.alpha_states.push((name.clone(), alpha));
                name
            }
        };
        self.push("gs", vec![Object::Name(name.into_bytes())]);
        self.current.fill_alpha = alpha;
    }

    /// `rg`
    pub fn set_fill_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.push("rg", vec![r.into(), g.into(), b.into()]);
    }

    /// `BT`
    pub fn begin_text(&mut self) -> Result<()> {
        if self.in_text {
            return Err(Error::Pdf("nested text object".into()));
        }
        self.in_text = true;
        self.push("BT", vec![]);
        Ok(())
    }

    /// `ET`
    pub fn end_text(&mut self) -> Result<()> {
        if !self.in_text {
            return Err(Error::Pdf("text object ended without being started".into()));
        }
        self.in_text = false;
        self.push("ET", vec![]);
        Ok(())
    }

    /// Select the text-layer font at `size`.
    pub fn set_font(&mut self, size: f32) {
        self.uses_font = true;
        self.push(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), size.into()],
        );
    }

    /// `Tr`
    pub fn set_text_render_mode(&mut self, mode: i64) {
        self.push("Tr", vec![mode.into()]);
    }

    /// `Td`
    pub fn move_text(&mut self, x: f32, y: f32) {
        self.push("Td", vec![x.into(), y.into()]);
    }

    /// `Tj` with already encoded glyph codes.
    pub fn show_text(&mut self, encoded: Vec<u8>) {
        self.push("Tj", vec![Object::String(encoded, StringFormat::Hexadecimal)]);
    }

    /// Paint `image` over the whole page. The `q`/`cm`/`Do`/`Q` block is
    /// self-contained and leaves the tracked graphics state untouched.
    /// Images cannot be painted inside a text object.
    pub fn draw_image(&mut self, image: ImageXObject) -> Result<()> {
        if self.in_text {
            return Err(Error::Pdf("image painted inside a text object".into()));
        }
        if self.image.is_some() {
            return Err(Error::Pdf("page already has an image".into()));
        }
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![
                (self.width as f32).into(),
                Object::Integer(0),
                Object::Integer(0),
                (self.height as f32).into(),
                Object::Integer(0),
                Object::Integer(0),
            ],
        );
        self.push("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]);
        self.push("Q", vec![]);
        self.image = Some(image);
        Ok(())
    }

    /// Remember a region's text for the page's exports.
    pub fn record_text(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }

    /// Count a placement that needed its font size clamped.
    pub fn note_clamped(&mut self) {
        self.clamped += 1;
    }

    /// Seal the page. Fails if a text object or saved state is still open.
    pub fn finish(self) -> Result<Page> {
        if self.in_text {
            return Err(Error::Pdf("page sealed inside a text object".into()));
        }
        if !self.saved.is_empty() {
            return Err(Error::Pdf(format!(
                "page sealed with {} unrestored graphics state(s)",
                self.saved.len()
            )));
        }
        Ok(Page {
            width: self.width,
            height: self.height,
            operations: self.operations,
            alpha_states: self.alpha_states,
            image: self.image,
            uses_font: self.uses_font,
            texts: self.texts,
            clamped: self.clamped,
        })
    }
}

/// A sealed page, ready for the assembler.
#[derive(Debug)]
pub struct Page {
    width: u32,
    height: u32,
    operations: Vec<Operation>,
    alpha_states: Vec<(String, f32)>,
    image: Option<ImageXObject>,
    uses_font: bool,
    texts: Vec<String>,
    clamped: usize,
}

impl Page {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded content stream.
    pub fn content(&self) -> Result<Vec<u8>> {
        let content = Content {
            operations: self.operations.clone(),
        };
        Ok(content.encode()?)
    }

    /// Operators in drawing order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// ExtGState resources as (name, fill alpha).
    pub fn alpha_states(&self) -> &[(String, f32)] {
        &self.alpha_states
    }

    pub fn image(&self) -> Option<&ImageXObject> {
        self.image.as_ref()
    }

    pub(crate) fn take_image(&mut self) -> Option<ImageXObject> {
        self.image.take()
    }

    /// Whether the content stream selects the text-layer font.
    pub fn uses_font(&self) -> bool {
        self.uses_font
    }

    /// Texts drawn on this page, in order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Number of placements whose font size was clamped.
    pub fn clamped(&self) -> usize {
        self.clamped
    }

    /// Text summary for the page's exports.
    pub fn page_text(&self, filename: impl Into<String>) -> PageText {
        PageText::new(filename, self.texts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(page: &Page) -> Vec<&str> {
        page.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn test_alpha_is_scoped_by_state_stack() {
        let mut canvas = Canvas::new(100, 50);
        assert_eq!(canvas.fill_alpha(), 1.0);

        canvas.save_state();
        canvas.set_fill_alpha(0.0);
        assert_eq!(canvas.fill_alpha(), 0.0);
        canvas.restore_state().unwrap();

        assert_eq!(canvas.fill_alpha(), 1.0);
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn test_alpha_states_are_shared() {
        let mut canvas = Canvas::new(10, 10);
        canvas.set_fill_alpha(0.0);
        canvas.set_fill_alpha(0.5);
        canvas.set_fill_alpha(0.0);
        let page = canvas.finish().unwrap();
        assert_eq!(page.alpha_states().len(), 2);
        assert_eq!(page.alpha_states()[0], ("GA0".to_string(), 0.0));
    }

    #[test]
    fn test_restore_without_save_fails() {
        let mut canvas = Canvas::new(10, 10);
        assert!(canvas.restore_state().is_err());
    }

    #[test]
    fn test_unbalanced_page_cannot_be_sealed() {
        let mut canvas = Canvas::new(10, 10);
        canvas.save_state();
        assert!(canvas.finish().is_err());

        let mut canvas = Canvas::new(10, 10);
        canvas.begin_text().unwrap();
        assert!(canvas.finish().is_err());
    }

    #[test]
    fn test_draw_image_spans_page() {
        let mut canvas = Canvas::new(640, 480);
        canvas
            .draw_image(ImageXObject::gray(640, 480, vec![0; 640 * 480]).unwrap())
            .unwrap();
        assert_eq!(canvas.state_depth(), 0);
        let page = canvas.finish().unwrap();

        assert_eq!(operators(&page), vec!["q", "cm", "Do", "Q"]);
        let cm = &page.operations()[1];
        assert_eq!(cm.operands[0].as_float().unwrap(), 640.0);
        assert_eq!(cm.operands[3].as_float().unwrap(), 480.0);
        assert!(page.image().is_some());
        assert!(!page.uses_font());
    }

    #[test]
    fn test_draw_image_rejected_inside_text_or_twice() {
        let image = || ImageXObject::gray(2, 2, vec![0; 4]).unwrap();

        let mut canvas = Canvas::new(2, 2);
        canvas.begin_text().unwrap();
        assert!(matches!(canvas.draw_image(image()), Err(Error::Pdf(_))));

        let mut canvas = Canvas::new(2, 2);
        canvas.draw_image(image()).unwrap();
        assert!(canvas.draw_image(image()).is_err());
        assert_eq!(operators(&canvas.finish().unwrap()), vec!["q", "cm", "Do", "Q"]);
    }

    #[test]
    fn test_content_encodes() {
        let mut canvas = Canvas::new(10, 10);
        canvas.begin_text().unwrap();
        canvas.set_font(12.0);
        canvas.move_text(1.0, 2.0);
        canvas.show_text(b"Hi".to_vec());
        canvas.end_text().unwrap();
        let page = canvas.finish().unwrap();

        let content = String::from_utf8_lossy(&page.content().unwrap()).into_owned();
        assert!(content.contains("/F1"));
        assert!(content.contains("Tf"));
        assert!(content.contains("<4869> Tj"));
        assert!(page.uses_font());
    }
}
