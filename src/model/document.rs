//! Document-level metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata written to the PDF Info dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Creator application
    pub creator: String,

    /// PDF producer
    pub producer: String,

    /// Creation date
    pub created: DateTime<Utc>,
}

impl Metadata {
    /// Create metadata stamped with the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Creation date in PDF date syntax (`D:YYYYMMDDHHmmSS+00'00'`).
    pub fn pdf_creation_date(&self) -> String {
        format!("D:{}+00'00'", self.created.format("%Y%m%d%H%M%S"))
    }
}

impl Default for Metadata {
    fn default() -> Self {
        let producer = format!("searchpdf {}", env!("CARGO_PKG_VERSION"));
        Self {
            title: None,
            creator: producer.clone(),
            producer,
            created: Utc::now(),
        }
    }
}
