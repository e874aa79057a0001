//! Decoded page images.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::detect::ImageFormat;

/// Color mode of the file as it was decoded, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Single luminance channel
    Gray,
    /// Luminance with alpha
    GrayAlpha,
    /// Red, green, blue
    Rgb,
    /// Red, green, blue with alpha
    Rgba,
    /// Anything the decoder reports that is not listed above
    Other,
}

impl ColorMode {
    /// Classify an `image` crate color type.
    pub fn from_color_type(color: image::ColorType) -> Self {
        use image::ColorType;
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Gray,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            _ => ColorMode::Other,
        }
    }

    /// Whether the mode carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::GrayAlpha | ColorMode::Rgba)
    }
}

/// Normalized 8-bit pixel data.
#[derive(Debug, Clone)]
pub enum PagePixels {
    /// 8-bit gray
    Gray(GrayImage),
    /// 8-bit RGB
    Rgb(RgbImage),
}

impl PagePixels {
    /// Normalize any decoded image to 8-bit gray or 8-bit RGB.
    ///
    /// Alpha is composited onto a white background.
    pub fn normalize(image: DynamicImage) -> Self {
        let mode = ColorMode::from_color_type(image.color());
        match (mode, image) {
            (ColorMode::Gray, DynamicImage::ImageLuma8(gray)) => PagePixels::Gray(gray),
            (ColorMode::Gray, other) => PagePixels::Gray(other.to_luma8()),
            (ColorMode::Rgb, DynamicImage::ImageRgb8(rgb)) => PagePixels::Rgb(rgb),
            (ColorMode::GrayAlpha, other) => {
                let la = other.to_luma_alpha8();
                let (w, h) = la.dimensions();
                PagePixels::Gray(GrayImage::from_fn(w, h, |x, y| {
                    let px = la.get_pixel(x, y);
                    image::Luma([over_white(px[0], px[1])])
                }))
            }
            (ColorMode::Rgba, other) | (ColorMode::Other, other) => {
                let rgba = other.to_rgba8();
                let (w, h) = rgba.dimensions();
                PagePixels::Rgb(RgbImage::from_fn(w, h, |x, y| {
                    let px = rgba.get_pixel(x, y);
                    image::Rgb([
                        over_white(px[0], px[3]),
                        over_white(px[1], px[3]),
                        over_white(px[2], px[3]),
                    ])
                }))
            }
            (ColorMode::Rgb, other) => PagePixels::Rgb(other.to_rgb8()),
        }
    }

    /// Pixel dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PagePixels::Gray(img) => img.dimensions(),
            PagePixels::Rgb(img) => img.dimensions(),
        }
    }

    /// Number of color components per pixel.
    pub fn components(&self) -> u8 {
        match self {
            PagePixels::Gray(_) => 1,
            PagePixels::Rgb(_) => 3,
        }
    }

    /// Raw interleaved sample bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PagePixels::Gray(img) => img.as_raw(),
            PagePixels::Rgb(img) => img.as_raw(),
        }
    }
}

fn over_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((value as u32 * a + 255 * (255 - a) + 127) / 255) as u8
}

/// A decoded page image at a fixed position in the input order.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Zero-based position in the natural-sorted input
    pub index: usize,

    /// File the image was read from
    pub path: PathBuf,

    /// Detected container format
    pub format: ImageFormat,

    /// Color mode before normalization
    pub color_mode: ColorMode,

    /// Normalized pixels
    pub pixels: PagePixels,

    /// Original bytes, kept for JPEG passthrough
    pub jpeg_data: Option<Vec<u8>>,
}

impl SourceImage {
    /// Build an RGB image that has no backing file. Used by engines and tests
    /// that synthesize pages in memory.
    pub fn from_rgb(index: usize, path: impl Into<PathBuf>, pixels: RgbImage) -> Self {
        Self {
            index,
            path: path.into(),
            format: ImageFormat::Png,
            color_mode: ColorMode::Rgb,
            pixels: PagePixels::Rgb(pixels),
            jpeg_data: None,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.dimensions().0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.dimensions().1
    }

    /// Pixel dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// File name without directory, used as the page label.
    pub fn file_name(&self) -> String {
        file_label(&self.path)
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA, Rgba, RgbaImage};

    #[test]
    fn test_color_mode_classification() {
        assert_eq!(ColorMode::from_color_type(image::ColorType::L8), ColorMode::Gray);
        assert_eq!(ColorMode::from_color_type(image::ColorType::Rgba16), ColorMode::Rgba);
        assert!(ColorMode::Rgba.has_alpha());
        assert!(!ColorMode::Rgb.has_alpha());
    }

    #[test]
    fn test_normalize_rgba_flattens_onto_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        match PagePixels::normalize(DynamicImage::ImageRgba8(rgba)) {
            PagePixels::Rgb(rgb) => {
                assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
                assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
            }
            PagePixels::Gray(_) => panic!("expected RGB output"),
        }
    }

    #[test]
    fn test_normalize_gray_alpha_stays_gray() {
        let mut la = GrayAlphaImage::new(1, 1);
        la.put_pixel(0, 0, LumaA([0, 0]));
        let pixels = PagePixels::normalize(DynamicImage::ImageLumaA8(la));
        assert_eq!(pixels.components(), 1);
        assert_eq!(pixels.as_bytes(), &[255]);
    }

    #[test]
    fn test_source_image_dimensions() {
        let img = SourceImage::from_rgb(0, "scans/p1.png", RgbImage::new(640, 480));
        assert_eq!(img.dimensions(), (640, 480));
        assert_eq!(img.file_name(), "p1.png");
    }
}
