//! Image XObject encoding.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, Stream};

use crate::detect::{jpeg_components, ImageFormat};
use crate::error::{Error, Result};
use crate::model::{PagePixels, SourceImage};

/// Stream filter of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Original JPEG bytes, embedded unchanged
    Dct,
    /// zlib-compressed 8-bit samples
    Flate,
}

impl ImageFilter {
    fn pdf_name(self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

/// An encoded page image, ready to become a PDF stream.
#[derive(Clone)]
pub struct ImageXObject {
    width: u32,
    height: u32,
    components: u8,
    filter: ImageFilter,
    data: Vec<u8>,
}

impl ImageXObject {
    /// Encode a source image.
    ///
    /// JPEG sources with one or three components are embedded as-is;
    /// everything else is compressed from the normalized pixels.
    pub fn encode(image: &SourceImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let components = image.pixels.components();

        if image.format == ImageFormat::Jpeg {
            if let Some(jpeg) = &image.jpeg_data {
                if jpeg_components(jpeg) == Some(components) {
                    return Ok(Self {
                        width,
                        height,
                        components,
                        filter: ImageFilter::Dct,
                        data: jpeg.clone(),
                    });
                }
                log::debug!(
                    "{}: JPEG layout not embeddable, re-encoding",
                    image.file_name()
                );
            }
        }

        match &image.pixels {
            PagePixels::Gray(_) => Self::gray(width, height, image.pixels.as_bytes().to_vec()),
            PagePixels::Rgb(_) => Self::rgb(width, height, image.pixels.as_bytes().to_vec()),
        }
    }

    /// Compress 8-bit gray samples.
    pub fn gray(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        Self::flate(width, height, 1, samples)
    }

    /// Compress 8-bit interleaved RGB samples.
    pub fn rgb(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        Self::flate(width, height, 3, samples)
    }

    fn flate(width: u32, height: u32, components: u8, samples: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * components as usize;
        if samples.len() != expected {
            return Err(Error::Pdf(format!(
                "image sample buffer is {} bytes, expected {}",
                samples.len(),
                expected
            )));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&samples)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            components,
            filter: ImageFilter::Flate,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter(&self) -> ImageFilter {
        self.filter
    }

    /// Encoded stream bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn color_space(&self) -> &'static str {
        if self.components == 1 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        }
    }

    /// Build the image stream. The data is already filtered, so the stream
    /// is excluded from document-level compression.
    pub fn into_stream(self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => Object::Name(self.color_space().as_bytes().to_vec()),
            "BitsPerComponent" => 8,
            "Filter" => Object::Name(self.filter.pdf_name().as_bytes().to_vec()),
        };
        Stream::new(dict, self.data).with_compression(false)
    }
}

impl std::fmt::Debug for ImageXObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageXObject")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("components", &self.components)
            .field("filter", &self.filter)
            .field("bytes", &self.data.len())
            .finish()
    }
}
