//! Raster and PDF format detection from magic bytes.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raster formats accepted as page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG / JFIF
    Jpeg,
    /// Tagged Image File Format (either byte order)
    Tiff,
}

impl ImageFormat {
    /// The matching `image` crate format.
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }

    /// MIME type for the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Tiff => "image/tiff",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Tiff => "TIFF",
        };
        f.write_str(name)
    }
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const TIFF_LE_MAGIC: &[u8] = b"II*\0";
const TIFF_BE_MAGIC: &[u8] = b"MM\0*";
const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_LEN: u64 = 16;

/// Detect the image format of a file from its first bytes.
///
/// # Example
/// ```no_run
/// use searchpdf::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("scans/page1.png").unwrap();
/// println!("format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<ImageFormat> {
    let path = path.as_ref();
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
        .map_err(|_| Error::UnsupportedImage(path.display().to_string()))
}

/// Detect the image format from the leading bytes of a file.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(PNG_MAGIC) {
        Ok(ImageFormat::Png)
    } else if data.starts_with(JPEG_MAGIC) {
        Ok(ImageFormat::Jpeg)
    } else if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        Ok(ImageFormat::Tiff)
    } else {
        Err(Error::UnsupportedImage("unrecognized magic bytes".to_string()))
    }
}

/// Check if bytes start with a supported image header.
pub fn is_image_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.len() >= PDF_MAGIC.len() + 3 && data.starts_with(PDF_MAGIC)
}

/// Number of color components declared by a JPEG frame header.
///
/// Walks the marker segments up to the first SOFn marker. Returns `None`
/// when the stream is truncated or the scan starts before any frame header.
pub fn jpeg_components(data: &[u8]) -> Option<u8> {
    if !data.starts_with(&JPEG_MAGIC[..2]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            // fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([*data.get(pos + 2)?, *data.get(pos + 3)?]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return data.get(pos + 9).copied();
        }
        pos += 2 + len;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        let data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(detect_format_from_bytes(data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(detect_format_from_bytes(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_tiff_both_byte_orders() {
        assert_eq!(
            detect_format_from_bytes(b"II*\0\x08\0\0\0").unwrap(),
            ImageFormat::Tiff
        );
        assert_eq!(
            detect_format_from_bytes(b"MM\0*\0\0\0\x08").unwrap(),
            ImageFormat::Tiff
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert!(detect_format_from_bytes(b"<!DOCTYPE html>").is_err());
        assert!(detect_format_from_bytes(b"").is_err());
        assert!(!is_image_bytes(b"GIF89a"));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.5\n"));
        assert!(!is_pdf_bytes(b"%PDF"));
        assert!(!is_pdf_bytes(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn test_jpeg_components_from_sof0() {
        // SOI, APP0 (len 4), SOF0 with 3 components
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0
            0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x20, 0x03, // SOF0
        ];
        assert_eq!(jpeg_components(&data), Some(3));
    }

    #[test]
    fn test_jpeg_components_skips_dht() {
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xC4, 0x00, 0x03, 0x00, // DHT is not a frame header
            0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x10, 0x00, 0x20, 0x01, // SOF2, gray
        ];
        assert_eq!(jpeg_components(&data), Some(1));
    }

    #[test]
    fn test_jpeg_components_truncated() {
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF]), None);
        assert_eq!(jpeg_components(b"\x89PNG"), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]), None);
    }
}
