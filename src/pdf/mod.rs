//! Searchable PDF synthesis.
//!
//! Each page shows its source image at one unit per pixel and carries an
//! invisible glyph run for every recognized region, positioned over the
//! visible text so viewers can search, select and copy it.
//!
//! The stages, in order:
//!
//! 1. [`CoordinateMapper`] turns an image-space region into a page-space
//!    [`PlacementSpec`](crate::model::PlacementSpec)
//! 2. [`TextLayerRenderer`] draws one invisible glyph run on a [`Canvas`]
//! 3. [`PageCompositor`] lays the image down and renders every region,
//!    producing a sealed [`Page`]
//! 4. [`DocumentAssembler`] collects pages and saves the file atomically

mod assembler;
mod canvas;
mod compositor;
pub mod font;
mod mapper;
mod text_layer;
mod xobject;

pub use assembler::{assemble, save_document, DocumentAssembler};
pub use canvas::{Canvas, Page, FONT_RESOURCE, IMAGE_RESOURCE};
pub use compositor::{PageCompositor, PreparedPage};
pub use font::{FontMode, FontResource};
pub use mapper::CoordinateMapper;
pub use text_layer::{TextLayerRenderer, TextMode};
pub use xobject::{ImageFilter, ImageXObject};
