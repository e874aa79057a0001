//! Directory scanning and image decoding.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::detect::{detect_format_from_bytes, ImageFormat};
use crate::error::{Error, Result};
use crate::model::{ColorMode, PagePixels, SourceImage};

use super::natsort::natural_cmp;

/// Largest page dimension most PDF viewers render without complaint.
const VIEWER_DIMENSION_LIMIT: u32 = 14_400;

/// Options for locating and decoding input images.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Accepted file extensions, lowercase, without the dot
    pub extensions: Vec<String>,

    /// Keep original JPEG bytes so the PDF can embed them without re-encoding
    pub jpeg_passthrough: bool,
}

impl LoadOptions {
    /// Create load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted extension set.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Enable or disable JPEG passthrough.
    pub fn with_jpeg_passthrough(mut self, enabled: bool) -> Self {
        self.jpeg_passthrough = enabled;
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "tif", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            jpeg_passthrough: true,
        }
    }
}

/// An input file at its position in the page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Zero-based page index
    pub index: usize,
    /// Path to the image
    pub path: PathBuf,
}

impl ImageEntry {
    /// File name used for ordering and labels.
    pub fn file_name(&self) -> String {
        crate::model::file_label(&self.path)
    }
}

/// Finds and decodes page images.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    options: LoadOptions,
}

impl ImageLoader {
    /// Create a loader with the given options.
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Loader options.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// List the accepted images in `dir`, naturally sorted by file name.
    ///
    /// Fails with [`Error::InputDirNotFound`] when `dir` is not a directory
    /// and with [`Error::NoImagesFound`] when nothing matches.
    pub fn scan(&self, dir: impl AsRef<Path>) -> Result<Vec<ImageEntry>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::InputDirNotFound(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if self.options.accepts(&path) {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(Error::NoImagesFound(dir.to_path_buf()));
        }

        paths.sort_by(|a, b| {
            let a = a.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let b = b.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            natural_cmp(&a, &b)
        });

        log::info!("Found {} image(s) in {}", paths.len(), dir.display());

        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| ImageEntry { index, path })
            .collect())
    }

    /// Decode one image and normalize its pixels.
    pub fn load(&self, entry: &ImageEntry) -> Result<SourceImage> {
        let data = fs::read(&entry.path)?;
        self.load_bytes(entry.index, &entry.path, data)
    }

    /// Decode an image already in memory.
    pub fn load_bytes(&self, index: usize, path: &Path, data: Vec<u8>) -> Result<SourceImage> {
        let format = detect_format_from_bytes(&data)
            .map_err(|_| Error::UnsupportedImage(path.display().to_string()))?;

        let decoded = ImageReader::with_format(Cursor::new(&data), format.to_image_format())
            .decode()
            .map_err(|e| Error::ImageDecode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                path: path.to_path_buf(),
                width,
                height,
            });
        }
        if width > VIEWER_DIMENSION_LIMIT || height > VIEWER_DIMENSION_LIMIT {
            log::warn!(
                "{} is {}x{} pixels; some viewers cannot display pages larger than {} units",
                path.display(),
                width,
                height,
                VIEWER_DIMENSION_LIMIT
            );
        }

        let color_mode = ColorMode::from_color_type(decoded.color());
        let pixels = PagePixels::normalize(decoded);
        log::debug!(
            "Loaded {} ({}, {:?}, {}x{})",
            path.display(),
            format,
            color_mode,
            width,
            height
        );

        let jpeg_data = (self.options.jpeg_passthrough && format == ImageFormat::Jpeg).then_some(data);

        Ok(SourceImage {
            index,
            path: path.to_path_buf(),
            format,
            color_mode,
            pixels,
            jpeg_data,
        })
    }
}
