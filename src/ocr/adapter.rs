//! Validation, filtering and serialized access around an [`OcrEngine`].

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::{Accelerator, OcrEngine, OcrOptions, RawDetection};
use crate::error::Result;
use crate::model::{Quad, SourceImage, TextRegion};

/// Per-image counts of what happened to the engine's detections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionStats {
    /// Regions kept
    pub accepted: usize,
    /// Regions dropped because their confidence was under the threshold
    pub below_threshold: usize,
    /// Regions dropped because their geometry or text was unusable
    pub malformed: usize,
}

/// Filtered recognition result for one image.
#[derive(Debug, Clone, Default)]
pub struct Recognition {
    /// Surviving regions, in engine order
    pub regions: Vec<TextRegion>,
    /// Drop counts
    pub stats: RecognitionStats,
}

enum Verdict {
    Keep(TextRegion),
    BelowThreshold,
    Malformed(&'static str),
}

/// Wraps an engine with filtering, validation and retry.
pub struct OcrAdapter {
    engine: Arc<dyn OcrEngine>,
    options: OcrOptions,
    serialize: bool,
    gate: Mutex<()>,
}

impl OcrAdapter {
    /// Create an adapter. Engine calls are serialized when the accelerator
    /// is available or the engine is not reentrant.
    pub fn new(engine: Arc<dyn OcrEngine>, options: OcrOptions, accelerator: Accelerator) -> Self {
        let serialize = accelerator.is_available() || !engine.is_reentrant();
        Self {
            engine,
            options,
            serialize,
            gate: Mutex::new(()),
        }
    }

    /// Adapter options.
    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    /// Name of the wrapped engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run the engine once on `image` and filter its output.
    pub fn recognize(&self, image: &SourceImage) -> Result<Recognition> {
        let raw = self.call_engine(image)?;
        Ok(self.filter(image, raw))
    }

    /// Like [`recognize`](Self::recognize), retrying failed engine calls up
    /// to the configured number of times.
    pub fn recognize_with_retry(&self, image: &SourceImage) -> Result<Recognition> {
        let mut attempt = 0;
        loop {
            match self.recognize(image) {
                Ok(recognition) => return Ok(recognition),
                Err(e) if attempt < self.options.retries => {
                    attempt += 1;
                    log::warn!(
                        "OCR failed on {} (attempt {}/{}): {}",
                        image.file_name(),
                        attempt,
                        self.options.retries + 1,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn call_engine(&self, image: &SourceImage) -> Result<Vec<RawDetection>> {
        if self.serialize {
            // The gate guards no data, so a poisoned lock is still usable.
            let _guard = self.gate.lock().unwrap_or_else(|e| e.into_inner());
            self.engine.recognize(image)
        } else {
            self.engine.recognize(image)
        }
    }

    /// Validate and threshold raw detections, preserving their order.
    pub fn filter(&self, image: &SourceImage, raw: Vec<RawDetection>) -> Recognition {
        let mut recognition = Recognition::default();
        for detection in raw {
            match self.judge(image.index, detection) {
                Verdict::Keep(region) => {
                    recognition.stats.accepted += 1;
                    recognition.regions.push(region);
                }
                Verdict::BelowThreshold => recognition.stats.below_threshold += 1,
                Verdict::Malformed(reason) => {
                    log::debug!("Dropped malformed region on {}: {}", image.file_name(), reason);
                    recognition.stats.malformed += 1;
                }
            }
        }
        log::debug!(
            "{}: {} region(s) kept, {} below threshold, {} malformed",
            image.file_name(),
            recognition.stats.accepted,
            recognition.stats.below_threshold,
            recognition.stats.malformed
        );
        recognition
    }

    fn judge(&self, image_index: usize, detection: RawDetection) -> Verdict {
        let Some(quad) = Quad::from_points(&detection.points) else {
            return Verdict::Malformed("needs four finite points");
        };
        if !detection.confidence.is_finite() {
            return Verdict::Malformed("non-finite confidence");
        }
        if detection.text.trim().is_empty() {
            return Verdict::Malformed("empty text");
        }
        if detection.text.contains('\0') || detection.text.contains('\u{FFFD}') {
            return Verdict::Malformed("text contains NUL or replacement characters");
        }
        if detection.confidence < self.options.threshold {
            return Verdict::BelowThreshold;
        }

        let text: String = detection.text.nfc().collect();
        Verdict::Keep(TextRegion::new(image_index, quad, text, detection.confidence))
    }
}

impl std::fmt::Debug for OcrAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrAdapter")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .field("serialize", &self.serialize)
            .finish()
    }
}
