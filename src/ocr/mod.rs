//! OCR boundary.
//!
//! Recognition engines implement [`OcrEngine`] and return raw detections in
//! the order they found them. [`OcrAdapter`] sits between an engine and the
//! pipeline: it validates and filters the raw output, serializes access to a
//! shared accelerator, and retries failed calls.
//!
//! Engines shipped with the crate:
//!
//! - [`SidecarEngine`]: reads results a separate OCR run saved as JSON next
//!   to each image (PaddleOCR list shape or a plain object shape)
//! - [`TesseractEngine`]: runs the `tesseract` binary and parses its TSV output
//!
//! [`OcrmypdfBackend`] is different: it hands the whole document to
//! `ocrmypdf`, which produces the searchable PDF itself.

mod accelerator;
mod adapter;
mod ocrmypdf;
mod options;
mod sidecar;
mod tesseract;

pub use accelerator::Accelerator;
pub use adapter::{OcrAdapter, Recognition, RecognitionStats};
pub use ocrmypdf::{OcrmypdfBackend, OcrmypdfOptions};
pub use options::OcrOptions;
pub use sidecar::SidecarEngine;
pub use tesseract::TesseractEngine;

use crate::error::Result;
use crate::model::SourceImage;
use serde::{Deserialize, Serialize};

/// One unvalidated detection as emitted by an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Polygon points in image space, normally four
    pub points: Vec<(f32, f32)>,

    /// Recognized text
    pub text: String,

    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl RawDetection {
    /// Create a new raw detection.
    pub fn new(points: Vec<(f32, f32)>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            points,
            text: text.into(),
            confidence,
        }
    }
}

/// A text recognition engine.
///
/// Implementations must return detections in their natural reading order;
/// that order becomes the page's text order.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Recognize text in one image.
    fn recognize(&self, image: &SourceImage) -> Result<Vec<RawDetection>>;

    /// Whether concurrent calls on one instance are safe and useful.
    ///
    /// Engines that return `false` are called from one thread at a time.
    fn is_reentrant(&self) -> bool {
        true
    }
}

/// An engine that never finds any text. Used for image-only output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextEngine;

impl OcrEngine for NoTextEngine {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize(&self, _image: &SourceImage) -> Result<Vec<RawDetection>> {
        Ok(Vec::new())
    }
}

/// Check a Tesseract-style language list such as `jpn+eng` or `chi_sim`.
///
/// The value ends up on a subprocess command line, so only ASCII
/// alphanumerics, `+` and `_` are allowed.
pub fn validate_language(lang: &str) -> Result<()> {
    use crate::error::Error;

    if lang.is_empty() || lang.len() > 64 {
        return Err(Error::InvalidConfig(format!(
            "invalid language code length: {:?}",
            lang
        )));
    }
    if let Some(c) = lang
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '+' && *c != '_')
    {
        return Err(Error::InvalidConfig(format!(
            "invalid character in language code: {:?}",
            c
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language() {
        assert!(validate_language("jpn+eng").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(validate_language("").is_err());
        assert!(validate_language("eng;rm -rf").is_err());
        assert!(validate_language("--psm").is_err());
    }

    #[test]
    fn test_no_text_engine() {
        let img = SourceImage::from_rgb(0, "a.png", image::RgbImage::new(1, 1));
        assert!(NoTextEngine.recognize(&img).unwrap().is_empty());
        assert!(NoTextEngine.is_reentrant());
    }
}
