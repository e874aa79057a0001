//! Page composition: image underneath, invisible text on top.

use super::canvas::{Canvas, Page};
use super::font::FontResource;
use super::mapper::CoordinateMapper;
use super::text_layer::TextLayerRenderer;
use super::xobject::ImageXObject;
use crate::error::Result;
use crate::model::{SourceImage, TextRegion};
use crate::ocr::{Recognition, RecognitionStats};

/// Everything a page needs that can be computed off the assembling thread.
#[derive(Debug)]
pub struct PreparedPage {
    /// Zero-based page index
    pub index: usize,
    /// Source file name
    pub filename: String,
    /// Page width in units (= image pixels)
    pub width: u32,
    /// Page height in units (= image pixels)
    pub height: u32,
    /// Encoded page image
    pub image: ImageXObject,
    /// Surviving text regions, in engine order
    pub regions: Vec<TextRegion>,
    /// Drop counts from recognition
    pub stats: RecognitionStats,
    /// Whether recognition failed and the page is image-only
    pub ocr_failed: bool,
}

impl PreparedPage {
    /// Encode `image` and attach its recognition result.
    pub fn new(image: &SourceImage, recognition: Recognition) -> Result<Self> {
        Ok(Self {
            index: image.index,
            filename: image.file_name(),
            width: image.width(),
            height: image.height(),
            image: ImageXObject::encode(image)?,
            regions: recognition.regions,
            stats: recognition.stats,
            ocr_failed: false,
        })
    }

    /// An image-only page whose recognition failed.
    pub fn without_text(image: &SourceImage, ocr_failed: bool) -> Result<Self> {
        let mut page = Self::new(image, Recognition::default())?;
        page.ocr_failed = ocr_failed;
        Ok(page)
    }
}

/// Builds sealed pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageCompositor {
    mapper: CoordinateMapper,
    renderer: TextLayerRenderer,
}

impl PageCompositor {
    /// Create a compositor.
    pub fn new(mapper: CoordinateMapper, renderer: TextLayerRenderer) -> Self {
        Self { mapper, renderer }
    }

    /// Compose one page: the image spans the page and every region is
    /// drawn over it in order.
    pub fn compose(&self, prepared: PreparedPage, font: &mut FontResource) -> Result<Page> {
        let PreparedPage {
            width,
            height,
            image,
            regions,
            filename,
            ..
        } = prepared;

        let mut canvas = Canvas::new(width, height);
        canvas.draw_image(image)?;

        let page_height = height as f32;
        for region in &regions {
            let placement = self.mapper.map(region, page_height);
            self.renderer
                .draw(&mut canvas, &placement, &region.text, font)?;
        }

        let page = canvas.finish()?;
        log::debug!(
            "Composed {} ({}x{}, {} text run(s))",
            filename,
            width,
            height,
            regions.len()
        );
        Ok(page)
    }
}
