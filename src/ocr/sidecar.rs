//! Engine that reads OCR results saved next to each image.
//!
//! Two JSON shapes are understood. The PaddleOCR result list:
//!
//! ```text
//! [[[[x, y], [x, y], [x, y], [x, y]], ["text", 0.97]], ...]
//! ```
//!
//! optionally wrapped in one more list (one entry per input image, where
//! `null` means nothing was found), and a plain object:
//!
//! ```text
//! {"regions": [{"points": [[x, y], ...], "text": "...", "confidence": 0.97}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{OcrEngine, RawDetection};
use crate::error::{Error, Result};
use crate::model::SourceImage;

/// Reads `<stem>.json` (or `<file name>.json`) for each image.
#[derive(Debug, Clone, Default)]
pub struct SidecarEngine {
    dir: Option<PathBuf>,
    strict: bool,
}

impl SidecarEngine {
    /// Look for sidecars next to the images.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for sidecars in `dir` instead of next to the images.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Treat a missing sidecar as an error instead of an empty page.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn candidates(&self, image: &Path) -> Vec<PathBuf> {
        let dir = self
            .dir
            .clone()
            .or_else(|| image.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let mut out = Vec::with_capacity(2);
        if let Some(stem) = image.file_stem() {
            let mut name = stem.to_os_string();
            name.push(".json");
            out.push(dir.join(name));
        }
        if let Some(file) = image.file_name() {
            let mut name = file.to_os_string();
            name.push(".json");
            out.push(dir.join(name));
        }
        out
    }

    /// Find the sidecar for `image`, if any.
    pub fn locate(&self, image: &Path) -> Option<PathBuf> {
        self.candidates(image).into_iter().find(|p| p.is_file())
    }
}

impl OcrEngine for SidecarEngine {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn recognize(&self, image: &SourceImage) -> Result<Vec<RawDetection>> {
        let Some(path) = self.locate(&image.path) else {
            if self.strict {
                return Err(Error::Ocr(format!(
                    "no OCR sidecar found for {}",
                    image.path.display()
                )));
            }
            log::debug!("No sidecar for {}; page has no text", image.file_name());
            return Ok(Vec::new());
        };

        let data = fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&data)
            .map_err(|e| Error::Ocr(format!("invalid sidecar {}: {}", path.display(), e)))?;
        parse_sidecar(&value)
            .ok_or_else(|| Error::Ocr(format!("unrecognized sidecar layout in {}", path.display())))
    }
}

/// Parse either sidecar shape. Returns `None` when the layout is not
/// recognized at all; individual bad entries are kept as-is so the adapter
/// can count them.
pub fn parse_sidecar(value: &Value) -> Option<Vec<RawDetection>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Object(map) => {
            let regions = map.get("regions")?.as_array()?;
            Some(regions.iter().map(parse_object_region).collect())
        }
        Value::Array(items) => {
            if items.len() == 1 && is_wrapper(&items[0]) {
                return parse_sidecar(&items[0]);
            }
            Some(items.iter().map(parse_paddle_entry).collect())
        }
        _ => None,
    }
}

fn is_point(value: &Value) -> bool {
    value
        .as_array()
        .map(|xs| xs.len() >= 2 && xs.iter().all(Value::is_number))
        .unwrap_or(false)
}

fn is_entry(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|xs| xs.first())
        .and_then(Value::as_array)
        .and_then(|pts| pts.first())
        .map(is_point)
        .unwrap_or(false)
}

/// A per-image wrapper: `null`, `[]`, or a list whose first item is an entry.
fn is_wrapper(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(xs) => xs.is_empty() || xs.first().map(is_entry).unwrap_or(false),
        _ => false,
    }
}

fn parse_points(value: Option<&Value>) -> Vec<(f32, f32)> {
    value
        .and_then(Value::as_array)
        .map(|pts| {
            pts.iter()
                .filter_map(|p| {
                    let xs = p.as_array()?;
                    let x = xs.first()?.as_f64()? as f32;
                    let y = xs.get(1)?.as_f64()? as f32;
                    Some((x, y))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_paddle_entry(entry: &Value) -> RawDetection {
    let parts = entry.as_array();
    let points = parse_points(parts.and_then(|p| p.first()));
    let rec = parts.and_then(|p| p.get(1)).and_then(Value::as_array);
    let text = rec
        .and_then(|r| r.first())
        .and_then(Value::as_str)
        .unwrap_or_default();
    let confidence = rec
        .and_then(|r| r.get(1))
        .and_then(Value::as_f64)
        .map(|c| c as f32)
        .unwrap_or(f32::NAN);
    RawDetection::new(points, text, confidence)
}

fn parse_object_region(region: &Value) -> RawDetection {
    let points = parse_points(region.get("points"));
    let text = region
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let confidence = region
        .get("confidence")
        .or_else(|| region.get("score"))
        .and_then(Value::as_f64)
        .map(|c| c as f32)
        .unwrap_or(f32::NAN);
    RawDetection::new(points, text, confidence)
}
