//! Data model shared by the pipeline stages.
//!
//! Each stage consumes one of these types and produces the next:
//! [`SourceImage`] → [`TextRegion`] → [`PlacementSpec`] → sealed page →
//! document. Secondary outputs work from [`PageText`].

mod document;
mod page;
mod placement;
mod region;
mod source;

pub use document::Metadata;
pub use page::PageText;
pub use placement::PlacementSpec;
pub use region::{Point, Quad, TextRegion};
pub use source::{ColorMode, PagePixels, SourceImage};

pub(crate) use source::file_label;
