//! Per-page text summaries.

use serde::{Deserialize, Serialize};

/// The text carried by one page, in region order.
///
/// This is the data the plain-text, JSON and DOCX outputs are built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Source file name
    pub filename: String,

    /// Region texts in engine order
    pub lines: Vec<String>,
}

impl PageText {
    /// Create a new page text summary.
    pub fn new(filename: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            filename: filename.into(),
            lines,
        }
    }

    /// Region texts joined by newlines.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the page carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}
