//! Directory conversion: images in, one searchable PDF out.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use searchpdf::convert::{ConvertOptions, Pipeline};
//! use searchpdf::ocr::SidecarEngine;
//!
//! fn main() -> searchpdf::Result<()> {
//!     let options = ConvertOptions::new()
//!         .with_threshold(0.6)
//!         .with_font("/usr/share/fonts/NotoSansCJK-Regular.ttc");
//!
//!     let report = Pipeline::new(Arc::new(SidecarEngine::new()), options)
//!         .run("scans/", "scans.pdf")?;
//!     println!("{} pages", report.page_count());
//!     Ok(())
//! }
//! ```

mod cancel;
mod options;
mod pipeline;
mod report;

pub use cancel::CancellationToken;
pub use options::{ConvertOptions, ErrorMode, RenderOptions};
pub use pipeline::Pipeline;
pub use report::{ConvertReport, PageReport, ProgressCallback, ProgressEvent};

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::ocr::OcrEngine;

/// Convert `input_dir` into a searchable PDF at `output` using `engine`.
pub fn convert_directory(
    input_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    engine: Arc<dyn OcrEngine>,
    options: &ConvertOptions,
) -> Result<ConvertReport> {
    Pipeline::new(engine, options.clone()).run(input_dir, output)
}

/// Combine the images in `input_dir` into an image-only PDF.
///
/// Secondary exports configured in `options` are not written.
pub fn combine_images(
    input_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConvertReport> {
    let mut options = options.clone();
    options.text_output = None;
    options.json_output = None;
    options.docx_output = None;
    Pipeline::images_only(options).run(input_dir, output)
}
