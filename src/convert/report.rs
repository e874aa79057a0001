//! Conversion report and progress events.

use std::path::PathBuf;

use serde::Serialize;

use crate::ocr::{Accelerator, RecognitionStats};
use crate::pdf::FontMode;

/// What happened to one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// Zero-based page index in the output
    pub index: usize,
    /// Source file name
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Text runs drawn on the page
    pub regions_rendered: usize,
    /// Regions dropped under the confidence threshold
    pub below_threshold: usize,
    /// Regions dropped as unusable
    pub malformed: usize,
    /// Runs whose font size was raised to the minimum
    pub clamped: usize,
    /// Recognition failed after retries; the page is image-only
    pub ocr_failed: bool,
}

impl PageReport {
    pub(crate) fn new(
        index: usize,
        filename: String,
        (width, height): (u32, u32),
        stats: RecognitionStats,
        clamped: usize,
        ocr_failed: bool,
    ) -> Self {
        Self {
            index,
            filename,
            width,
            height,
            regions_rendered: stats.accepted,
            below_threshold: stats.below_threshold,
            malformed: stats.malformed,
            clamped,
            ocr_failed,
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Written PDF
    pub output: PathBuf,
    /// Pages in output order
    pub pages: Vec<PageReport>,
    /// Input files skipped as undecodable (lenient mode only)
    pub skipped: Vec<String>,
    /// Images found in the input directory
    pub total_images: usize,
    /// Font used for the text layer
    pub font_mode: FontMode,
    /// Characters the font could not encode
    pub unencodable_chars: usize,
    /// Accelerator state decided at startup
    pub accelerator: String,
}

impl ConvertReport {
    /// Pages in the output document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text runs drawn across all pages.
    pub fn regions_rendered(&self) -> usize {
        self.pages.iter().map(|p| p.regions_rendered).sum()
    }

    /// Regions dropped for any reason across all pages.
    pub fn regions_dropped(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.below_threshold + p.malformed)
            .sum()
    }

    /// Pages whose recognition failed.
    pub fn ocr_failures(&self) -> usize {
        self.pages.iter().filter(|p| p.ocr_failed).count()
    }

    pub(crate) fn new(output: PathBuf, total_images: usize, accelerator: Accelerator) -> Self {
        Self {
            output,
            pages: Vec::new(),
            skipped: Vec::new(),
            total_images,
            font_mode: FontMode::Builtin,
            unencodable_chars: 0,
            accelerator: accelerator.to_string(),
        }
    }
}

/// Progress notifications emitted during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Scanning finished; `total` images will be processed
    Started { total: usize },
    /// One input finished (composed or skipped)
    Page {
        completed: usize,
        total: usize,
        filename: String,
        skipped: bool,
    },
    /// All pages composed; the document is being written
    Saving { path: PathBuf },
    /// Output and exports written
    Done,
}

/// Progress callback.
pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;
