//! Text-layer fonts.
//!
//! A page's invisible text needs a font whose encoding maps back to
//! Unicode. Two kinds are supported:
//!
//! - an embedded TrueType face (a `.ttf` file or one face of a `.ttc`),
//!   written as Type0/Identity-H with a ToUnicode CMap so any script can be
//!   searched and copied; only the used glyphs are embedded
//! - builtin Helvetica with WinAnsi encoding, used when no font is
//!   configured or the configured one fails to load; characters outside
//!   WinAnsi come out as `?`

mod builtin;
mod cmap;
mod collection;
mod subset;
mod truetype;

pub use builtin::{encode_winansi, winansi_code};
pub use cmap::to_unicode_cmap;
pub use collection::{extract_face, face_count, is_collection};
pub use subset::{subset, subset_tag};
pub use truetype::TrueTypeFont;

use std::fs;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which kind of font the text layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontMode {
    /// Embedded TrueType face
    Embedded,
    /// Builtin Helvetica fallback
    Builtin,
}

impl std::fmt::Display for FontMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontMode::Embedded => f.write_str("embedded"),
            FontMode::Builtin => f.write_str("builtin"),
        }
    }
}

#[derive(Debug, Clone)]
enum Inner {
    Builtin,
    TrueType(Box<TrueTypeFont>),
}

/// The font shared by every page of a document.
#[derive(Debug, Clone)]
pub struct FontResource {
    inner: Inner,
    lost_chars: usize,
}

impl FontResource {
    /// Builtin Helvetica.
    pub fn builtin() -> Self {
        Self {
            inner: Inner::Builtin,
            lost_chars: 0,
        }
    }

    /// Load face `face_index` from a `.ttf` or `.ttc` file.
    pub fn load(path: impl AsRef<Path>, face_index: u32) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|e| Error::Font(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(&data, face_index)
    }

    /// Parse a font from memory.
    pub fn from_bytes(data: &[u8], face_index: u32) -> Result<Self> {
        let sfnt = extract_face(data, face_index)?;
        let font = TrueTypeFont::from_sfnt(sfnt)?;
        log::info!("Using embedded font {}", font.name());
        Ok(Self {
            inner: Inner::TrueType(Box::new(font)),
            lost_chars: 0,
        })
    }

    /// Load the configured font, falling back to builtin Helvetica with a
    /// warning when there is none or it cannot be used.
    pub fn load_or_fallback(path: Option<&Path>, face_index: u32) -> Self {
        let Some(path) = path else {
            log::warn!(
                "No text-layer font configured; using builtin Helvetica (non-Latin text will not be searchable)"
            );
            return Self::builtin();
        };
        match Self::load(path, face_index) {
            Ok(font) => font,
            Err(e) => {
                log::warn!(
                    "Could not use font {} ({}); falling back to builtin Helvetica, non-Latin text will not be searchable",
                    path.display(),
                    e
                );
                Self::builtin()
            }
        }
    }

    pub fn mode(&self) -> FontMode {
        match self.inner {
            Inner::Builtin => FontMode::Builtin,
            Inner::TrueType(_) => FontMode::Embedded,
        }
    }

    /// Base font name.
    pub fn name(&self) -> &str {
        match &self.inner {
            Inner::Builtin => "Helvetica",
            Inner::TrueType(font) => font.name(),
        }
    }

    /// Characters encoded so far that the font could not represent.
    pub fn lost_chars(&self) -> usize {
        self.lost_chars
    }

    /// Encode `text` for a `Tj` operand.
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        let (bytes, lost) = match &mut self.inner {
            Inner::Builtin => encode_winansi(text),
            Inner::TrueType(font) => font.encode(text),
        };
        if lost > 0 {
            log::debug!("{} character(s) of {:?} not in font {}", lost, text, self.name());
            self.lost_chars += lost;
        }
        bytes
    }

    /// Write the font dictionary (and any dependent objects) at `id`.
    pub fn write(&self, doc: &mut Document, id: ObjectId) -> Result<()> {
        match &self.inner {
            Inner::Builtin => {
                doc.objects
                    .insert(id, Object::Dictionary(builtin::font_dictionary()));
                Ok(())
            }
            Inner::TrueType(font) => font.write(doc, id),
        }
    }
}

impl Default for FontResource {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_without_path() {
        let font = FontResource::load_or_fallback(None, 0);
        assert_eq!(font.mode(), FontMode::Builtin);
        assert_eq!(font.name(), "Helvetica");
    }

    #[test]
    fn test_fallback_on_missing_file() {
        let font = FontResource::load_or_fallback(Some(Path::new("/no/such/font.ttc")), 0);
        assert_eq!(font.mode(), FontMode::Builtin);
    }

    #[test]
    fn test_fallback_on_invalid_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"\x00\x01\x00\x00garbage").unwrap();
        assert!(FontResource::load(&path, 0).is_err());
        let font = FontResource::load_or_fallback(Some(&path), 0);
        assert_eq!(font.mode(), FontMode::Builtin);
    }

    #[test]
    fn test_builtin_encoding_counts_losses() {
        let mut font = FontResource::builtin();
        assert_eq!(font.encode("Hi"), b"Hi".to_vec());
        assert_eq!(font.encode("日本"), b"??".to_vec());
        assert_eq!(font.lost_chars(), 2);
    }

    #[test]
    fn test_builtin_writes_type1() {
        let mut doc = Document::with_version("1.5");
        let id = doc.new_object_id();
        FontResource::builtin().write(&mut doc, id).unwrap();
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type1");
        assert_eq!(
            dict.get(b"Encoding").unwrap().as_name().unwrap(),
            b"WinAnsiEncoding"
        );
    }
}
