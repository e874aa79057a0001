//! # searchpdf
//!
//! Searchable PDF synthesis from scanned page images.
//!
//! Every page of the output shows an input image at its pixel size and
//! carries an invisible text layer built from OCR results, so the document
//! can be searched and its text selected and copied.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use searchpdf::{convert_directory, ConvertOptions, SidecarEngine};
//!
//! fn main() -> searchpdf::Result<()> {
//!     let options = ConvertOptions::new().with_threshold(0.6);
//!     let report = convert_directory("scans/", "scans.pdf", Arc::new(SidecarEngine::new()), &options)?;
//!     println!("{} pages, {} text runs", report.page_count(), report.regions_rendered());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Pixel-exact pages**: one PDF unit per image pixel, no resampling
//! - **Invisible, positioned text**: one glyph run per recognized region
//! - **CJK support**: embedded TrueType/OpenType fonts (including `.ttc`
//!   collections) with a ToUnicode map for copy and search
//! - **Parallel recognition**: bounded worker pool, deterministic page order
//! - **Pluggable OCR**: sidecar JSON, Tesseract, or delegation to `ocrmypdf`
//! - **Secondary exports**: plain text, JSON and DOCX

mod atomic;

pub mod convert;
pub mod detect;
pub mod error;
pub mod input;
pub mod model;
pub mod ocr;
pub mod pdf;
pub mod render;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types
pub use convert::{
    combine_images, convert_directory, CancellationToken, ConvertOptions, ConvertReport,
    ErrorMode, PageReport, Pipeline, ProgressEvent, RenderOptions,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, ImageFormat};
pub use error::{Error, Result};
pub use input::{ImageLoader, LoadOptions};
pub use model::{Metadata, PageText, PlacementSpec, Point, Quad, SourceImage, TextRegion};
pub use ocr::{
    Accelerator, NoTextEngine, OcrAdapter, OcrEngine, OcrOptions, OcrmypdfBackend,
    OcrmypdfOptions, RawDetection, SidecarEngine, TesseractEngine,
};
pub use pdf::{DocumentAssembler, FontMode, FontResource, TextMode};
pub use render::JsonFormat;

/// Convert a directory on a blocking thread.
///
/// The pipeline itself is synchronous; this runs it through
/// `tokio::task::spawn_blocking`.
#[cfg(feature = "async")]
pub async fn convert_directory_async(
    input_dir: std::path::PathBuf,
    output: std::path::PathBuf,
    engine: std::sync::Arc<dyn OcrEngine>,
    options: ConvertOptions,
) -> Result<ConvertReport> {
    tokio::task::spawn_blocking(move || convert_directory(&input_dir, &output, engine, &options))
        .await
        .map_err(|e| Error::Other(format!("conversion task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .lenient()
            .with_threshold(0.7)
            .with_font("font.ttc")
            .with_font_index(2);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.ocr.threshold, 0.7);
        assert_eq!(options.render.font_index, 2);
        assert!(options.render.font_path.is_some());
    }

    #[test]
    fn test_convert_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let result = convert_directory(
            dir.path().join("missing"),
            &output,
            std::sync::Arc::new(NoTextEngine),
            &ConvertOptions::new().with_accelerator(false),
        );
        assert!(matches!(result, Err(Error::InputDirNotFound(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_detect_format_unknown_magic() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html><html></html>");
        assert!(result.is_err());
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(detect::is_pdf_bytes(b"%PDF-1.5\ntest"));
        assert!(!detect::is_pdf_bytes(b"Not a PDF file"));
        assert!(!detect::is_pdf_bytes(b""));
    }

    #[test]
    fn test_json_format_default() {
        assert_eq!(JsonFormat::default(), JsonFormat::Pretty);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_async_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_directory_async(
            dir.path().join("missing"),
            dir.path().join("out.pdf"),
            std::sync::Arc::new(NoTextEngine),
            ConvertOptions::new().with_accelerator(false),
        )
        .await;
        assert!(matches!(result, Err(Error::InputDirNotFound(_))));
    }
}
