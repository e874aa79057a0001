//! OCR adapter options.

use crate::error::{Error, Result};

/// Options controlling how engine output is filtered.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Minimum confidence a region needs to be kept (inclusive)
    pub threshold: f32,

    /// Engine language list, Tesseract style (`jpn+eng`)
    pub language: String,

    /// Additional attempts after a failed engine call
    pub retries: u32,
}

impl OcrOptions {
    /// Create OCR options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the engine language list.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the number of retries per image.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        super::validate_language(&self.language)
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            language: "jpn+eng".to_string(),
            retries: 1,
        }
    }
}
