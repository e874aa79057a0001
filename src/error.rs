//! Error types for searchpdf library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for searchpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a searchable PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input directory does not exist or is not a directory.
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    /// The input directory holds no image with an accepted extension.
    #[error("No images found in {}", .0.display())]
    NoImagesFound(PathBuf),

    /// Assembly finished without a single page.
    #[error("Document has no pages; refusing to write an empty PDF")]
    EmptyDocument,

    /// The file is not a recognized raster image.
    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    /// The image could not be decoded.
    #[error("Failed to decode image {}: {message}", .path.display())]
    ImageDecode {
        /// Source path
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// The image decoded to zero width or height.
    #[error("Image {} has invalid dimensions {width}x{height}", .path.display())]
    InvalidDimensions {
        /// Source path
        path: PathBuf,
        /// Decoded width
        width: u32,
        /// Decoded height
        height: u32,
    },

    /// The OCR engine failed on an image.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// An external program exited unsuccessfully.
    #[error("{tool} failed (exit status {}): {stderr}", .status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ExternalTool {
        /// Program name
        tool: String,
        /// Exit code, if the process exited normally
        status: Option<i32>,
        /// Captured diagnostic output
        stderr: String,
    },

    /// A font could not be loaded or embedded.
    #[error("Font error: {0}")]
    Font(String),

    /// Error building or writing the PDF object graph.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Error rendering a secondary output (text, JSON, DOCX).
    #[error("Rendering error: {0}")]
    Render(String),

    /// An option value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled before the document was saved.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts a whole run rather than a single page.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InputDirNotFound(_)
                | Error::NoImagesFound(_)
                | Error::EmptyDocument
                | Error::Cancelled
                | Error::InvalidConfig(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(e) => Error::UnsupportedImage(e.to_string()),
            other => Error::ImageDecode {
                path: PathBuf::new(),
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON error: {}", err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Render(format!("DOCX container error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoImagesFound(PathBuf::from("scans"));
        assert_eq!(err.to_string(), "No images found in scans");

        let err = Error::ExternalTool {
            tool: "ocrmypdf".to_string(),
            status: Some(2),
            stderr: "bad input".to_string(),
        };
        assert_eq!(err.to_string(), "ocrmypdf failed (exit status 2): bad input");
    }

    #[test]
    fn test_external_tool_without_status() {
        let err = Error::ExternalTool {
            tool: "tesseract".to_string(),
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::EmptyDocument.is_fatal());
        assert!(Error::Cancelled.is_fatal());
        assert!(!Error::Ocr("timeout".into()).is_fatal());
        assert!(!Error::Font("missing".into()).is_fatal());
    }
}
