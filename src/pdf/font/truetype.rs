//! Embedded TrueType fonts as Type0 / CIDFontType2 with Identity-H encoding.
//!
//! Only the glyphs the text layer used are embedded (see [`subset`]).

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{name_id, Face, GlyphId, Tag};

use super::cmap::to_unicode_cmap;
use super::subset::{subset, subset_tag};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct Metrics {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

/// A parsed TrueType face plus the glyphs used so far.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    data: Vec<u8>,
    postscript_name: String,
    metrics: Metrics,
    glyphs: HashMap<char, Option<(u16, u16)>>,
    used: BTreeMap<u16, (u16, String)>,
}

impl TrueTypeFont {
    /// Parse a standalone sfnt. Fonts without `glyf` outlines are rejected
    /// because they cannot be embedded as CIDFontType2.
    pub fn from_sfnt(data: Vec<u8>) -> Result<Self> {
        let face = Face::parse(&data, 0).map_err(|e| Error::Font(format!("invalid font: {}", e)))?;

        if face.raw_face().table(Tag::from_bytes(b"glyf")).is_none() {
            return Err(Error::Font(
                "font has no TrueType outlines (CFF fonts are not supported)".into(),
            ));
        }

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| sanitize_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let bbox = face.global_bounding_box();
        let metrics = Metrics {
            units_per_em: face.units_per_em().max(1),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
        };

        drop(face);
        Ok(Self {
            data,
            postscript_name,
            metrics,
            glyphs: HashMap::new(),
            used: BTreeMap::new(),
        })
    }

    /// PostScript name used as `BaseFont`.
    pub fn name(&self) -> &str {
        &self.postscript_name
    }

    /// Number of distinct glyphs used so far.
    pub fn used_glyphs(&self) -> usize {
        self.used.len()
    }

    fn scale(&self, v: i32) -> i64 {
        (v as i64 * 1000) / self.metrics.units_per_em as i64
    }

    /// Encode `text` as two-byte glyph ids, recording each glyph's advance
    /// and source text. Returns the codes and the number of characters the
    /// font has no glyph for.
    pub fn encode(&mut self, text: &str) -> (Vec<u8>, usize) {
        let missing: Vec<char> = text
            .chars()
            .filter(|c| !self.glyphs.contains_key(c))
            .collect();
        if !missing.is_empty() {
            if let Ok(face) = Face::parse(&self.data, 0) {
                for c in missing {
                    let entry = face.glyph_index(c).map(|GlyphId(gid)| {
                        let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
                        (gid, advance)
                    });
                    self.glyphs.insert(c, entry);
                }
            }
        }

        let mut out = Vec::with_capacity(text.len() * 2);
        let mut lost = 0;
        for c in text.chars() {
            let (gid, advance) = match self.glyphs.get(&c).copied().flatten() {
                Some(glyph) => glyph,
                None => {
                    lost += 1;
                    (0, 0)
                }
            };
            if gid != 0 {
                self.used
                    .entry(gid)
                    .or_insert_with(|| (advance, c.to_string()));
            }
            out.extend_from_slice(&gid.to_be_bytes());
        }
        (out, lost)
    }

    /// The font program to embed, with its `BaseFont` name: a subset
    /// holding just the used glyphs, or the whole face when subsetting
    /// fails.
    fn program(&self) -> (Cow<'_, [u8]>, String) {
        let gids = self.used.keys().copied();
        match subset(&self.data, gids.clone()) {
            Ok(program) => (
                Cow::Owned(program),
                format!("{}+{}", subset_tag(gids), self.postscript_name),
            ),
            Err(e) => {
                log::warn!(
                    "Could not subset font {} ({}); embedding the whole face",
                    self.postscript_name,
                    e
                );
                (Cow::Borrowed(self.data.as_slice()), self.postscript_name.clone())
            }
        }
    }

    /// Write the font objects. The Type0 font dictionary goes to `id`.
    pub fn write(&self, doc: &mut Document, id: ObjectId) -> Result<()> {
        let (program, base_font) = self.program();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&program)?;
        let compressed = encoder.finish()?;
        let font_file = Stream::new(
            dictionary! {
                "Length1" => program.len() as i64,
                "Filter" => "FlateDecode",
            },
            compressed,
        )
        .with_compression(false);
        let font_file_id = doc.add_object(font_file);
        let base_font = Object::Name(base_font.into_bytes());

        let m = self.metrics;
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 4,
            "FontBBox" => vec![
                Object::Integer(self.scale(m.bbox[0] as i32)),
                Object::Integer(self.scale(m.bbox[1] as i32)),
                Object::Integer(self.scale(m.bbox[2] as i32)),
                Object::Integer(self.scale(m.bbox[3] as i32)),
            ],
            "ItalicAngle" => 0,
            "Ascent" => self.scale(m.ascender as i32),
            "Descent" => self.scale(m.descender as i32),
            "CapHeight" => self.scale(m.cap_height as i32),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut widths = Vec::with_capacity(self.used.len() * 2);
        for (gid, (advance, _)) in &self.used {
            widths.push(Object::Integer(*gid as i64));
            widths.push(Object::Array(vec![Object::Integer(
                self.scale(*advance as i32),
            )]));
        }

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let mappings: Vec<(u16, String)> = self
            .used
            .iter()
            .map(|(gid, (_, text))| (*gid, text.clone()))
            .collect();
        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            to_unicode_cmap(&mappings).into_bytes(),
        ));

        doc.objects.insert(
            id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => base_font,
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_font_id)],
                "ToUnicode" => to_unicode_id,
            }),
        );
        Ok(())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("MS Gothic"), "MSGothic");
        assert_eq!(sanitize_name("Noto(Sans)/JP"), "NotoSansJP");
    }

    const DEJAVU: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/DejaVuSans.ttf"
    ));

    #[test]
    fn test_encode_records_used_glyphs() {
        let mut font = TrueTypeFont::from_sfnt(DEJAVU.to_vec()).unwrap();
        assert_eq!(font.name(), "DejaVuSans");

        let (codes, lost) = font.encode("Ωmega Ω");
        assert_eq!(lost, 0);
        assert_eq!(codes.len(), 14);
        assert_eq!(codes[..2], codes[12..]);
        // Ω, m, e, g, a, space
        assert_eq!(font.used_glyphs(), 6);

        let (_, lost) = font.encode("日");
        assert_eq!(lost, 1);
    }

    #[test]
    fn test_write_embeds_tagged_subset() {
        let mut font = TrueTypeFont::from_sfnt(DEJAVU.to_vec()).unwrap();
        font.encode("Grüße");

        let mut doc = Document::with_version("1.5");
        let id = doc.new_object_id();
        font.write(&mut doc, id).unwrap();

        let type0 = doc.get_dictionary(id).unwrap();
        let base_font = type0.get(b"BaseFont").unwrap().as_name().unwrap();
        assert_eq!(base_font.len(), "ABCDEF+DejaVuSans".len());
        assert!(base_font.ends_with(b"+DejaVuSans"));
        assert!(base_font[..6].iter().all(u8::is_ascii_uppercase));

        let program_len = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find_map(|s| s.dict.get(b"Length1").ok()?.as_i64().ok())
            .unwrap();
        assert!((program_len as usize) < DEJAVU.len() / 4);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            TrueTypeFont::from_sfnt(b"not a font at all".to_vec()),
            Err(Error::Font(_))
        ));
    }
}
