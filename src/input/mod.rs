//! Locating and decoding page images.

mod loader;
mod natsort;

pub use loader::{ImageEntry, ImageLoader, LoadOptions};
pub use natsort::{natural_cmp, natural_sort};
