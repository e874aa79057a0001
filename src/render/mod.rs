//! Secondary exports of recognized text.
//!
//! The searchable PDF is the primary output; these renderers write the same
//! page texts as plain text, JSON or a minimal DOCX document.

mod docx;
mod json;
mod text;

pub use docx::{to_docx, EMPTY_PAGE_TEXT};
pub use json::{to_json, JsonFormat};
pub use text::to_text;

use std::path::Path;

use crate::atomic::write_atomic;
use crate::error::Result;
use crate::model::PageText;

/// Title used for exports when none is configured.
pub const DEFAULT_TITLE: &str = "OCR result";

/// Write the plain-text export to `path`.
pub fn write_text(pages: &[PageText], path: &Path) -> Result<()> {
    write_atomic(path, to_text(pages).as_bytes())?;
    log::info!("Wrote text export {}", path.display());
    Ok(())
}

/// Write the JSON export to `path`.
pub fn write_json(pages: &[PageText], title: Option<&str>, path: &Path) -> Result<()> {
    let json = to_json(pages, title, JsonFormat::Pretty)?;
    write_atomic(path, json.as_bytes())?;
    log::info!("Wrote JSON export {}", path.display());
    Ok(())
}

/// Write the DOCX export to `path`.
pub fn write_docx(pages: &[PageText], title: Option<&str>, path: &Path) -> Result<()> {
    let bytes = to_docx(pages, title.unwrap_or(DEFAULT_TITLE))?;
    write_atomic(path, &bytes)?;
    log::info!("Wrote DOCX export {}", path.display());
    Ok(())
}
