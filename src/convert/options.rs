//! Conversion options.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::input::LoadOptions;
use crate::model::Metadata;
use crate::ocr::OcrOptions;
use crate::pdf::{CoordinateMapper, FontResource, PageCompositor, TextLayerRenderer, TextMode};

/// Error handling mode for unreadable input images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first image that cannot be decoded
    #[default]
    Strict,
    /// Skip undecodable images with a warning and continue
    Lenient,
}

/// Options for placing and drawing the text layer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// TrueType/OpenType font (or collection) for the text layer
    pub font_path: Option<PathBuf>,

    /// Face index inside a font collection
    pub font_index: u32,

    /// Font size as a fraction of region height
    pub shrink_factor: f32,

    /// Floor for degenerate region heights
    pub min_font_size: f32,

    /// How glyphs are kept invisible
    pub text_mode: TextMode,
}

impl RenderOptions {
    /// Create default render options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new()
            .with_shrink_factor(self.shrink_factor)
            .with_min_font_size(self.min_font_size)
    }

    pub fn renderer(&self) -> TextLayerRenderer {
        TextLayerRenderer::new(self.text_mode)
    }

    pub fn compositor(&self) -> PageCompositor {
        PageCompositor::new(self.mapper(), self.renderer())
    }

    /// Load the configured font, or the builtin fallback.
    pub fn load_font(&self) -> FontResource {
        FontResource::load_or_fallback(self.font_path.as_deref(), self.font_index)
    }

    /// Check that the numbers make sense.
    pub fn validate(&self) -> Result<()> {
        if !self.shrink_factor.is_finite() || self.shrink_factor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "shrink factor must be positive, got {}",
                self.shrink_factor
            )));
        }
        if !self.min_font_size.is_finite() || self.min_font_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "minimum font size must be positive, got {}",
                self.min_font_size
            )));
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            font_path: None,
            font_index: 0,
            shrink_factor: 0.9,
            min_font_size: 1.0,
            text_mode: TextMode::default(),
        }
    }
}

/// Options for a whole directory conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Input scanning and decoding
    pub load: LoadOptions,

    /// Recognition filtering and retries
    pub ocr: OcrOptions,

    /// Text layer placement and font
    pub render: RenderOptions,

    /// Whether to probe for a GPU accelerator
    pub use_accelerator: bool,

    /// Worker count (`None` = derive from the accelerator)
    pub workers: Option<usize>,

    /// What to do with undecodable images
    pub error_mode: ErrorMode,

    /// Document title for PDF metadata and exports
    pub title: Option<String>,

    /// Plain-text export destination
    pub text_output: Option<PathBuf>,

    /// JSON export destination
    pub json_output: Option<PathBuf>,

    /// DOCX export destination
    pub docx_output: Option<PathBuf>,
}

impl ConvertOptions {
    /// Create default conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.ocr = self.ocr.with_threshold(threshold);
        self
    }

    /// Set the OCR language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.ocr = self.ocr.with_language(language);
        self
    }

    /// Set the OCR retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.ocr = self.ocr.with_retries(retries);
        self
    }

    /// Set input scanning options.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Set the text-layer font.
    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.render.font_path = Some(path.into());
        self
    }

    /// Set the face index used for font collections.
    pub fn with_font_index(mut self, index: u32) -> Self {
        self.render.font_index = index;
        self
    }

    /// Use text render mode 3 instead of a transparent fill.
    pub fn with_invisible_text(mut self) -> Self {
        self.render.text_mode = TextMode::Invisible;
        self
    }

    /// Enable or disable the accelerator probe.
    pub fn with_accelerator(mut self, enabled: bool) -> Self {
        self.use_accelerator = enabled;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip undecodable images).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Also write a plain-text export.
    pub fn with_text_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.text_output = Some(path.into());
        self
    }

    /// Also write a JSON export.
    pub fn with_json_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_output = Some(path.into());
        self
    }

    /// Also write a DOCX export.
    pub fn with_docx_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.docx_output = Some(path.into());
        self
    }

    /// PDF metadata derived from these options.
    pub fn metadata(&self) -> Metadata {
        match &self.title {
            Some(title) => Metadata::new().with_title(title.clone()),
            None => Metadata::new(),
        }
    }

    /// Validate all nested options.
    pub fn validate(&self) -> Result<()> {
        self.ocr.validate()?;
        self.render.validate()?;
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("worker count must be at least 1".into()));
        }
        if self.load.extensions.is_empty() {
            return Err(Error::InvalidConfig("no input extensions configured".into()));
        }
        Ok(())
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            ocr: OcrOptions::default(),
            render: RenderOptions::default(),
            use_accelerator: true,
            workers: None,
            error_mode: ErrorMode::Strict,
            title: None,
            text_output: None,
            json_output: None,
            docx_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.ocr.threshold, 0.6);
        assert_eq!(options.ocr.retries, 1);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.render.shrink_factor, 0.9);
        assert!(options.use_accelerator);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = ConvertOptions::new()
            .with_threshold(0.8)
            .with_language("eng")
            .with_workers(3)
            .with_invisible_text()
            .lenient()
            .with_title("Scans");
        assert_eq!(options.ocr.threshold, 0.8);
        assert_eq!(options.ocr.language, "eng");
        assert_eq!(options.workers, Some(3));
        assert_eq!(options.render.text_mode, TextMode::Invisible);
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.metadata().title.as_deref(), Some("Scans"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ConvertOptions::new().with_workers(0).validate().is_err());
        assert!(ConvertOptions::new().with_threshold(1.5).validate().is_err());

        let mut options = ConvertOptions::new();
        options.render.shrink_factor = 0.0;
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));
    }
}
