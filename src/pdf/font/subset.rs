//! Glyph subsetting for embedded TrueType fonts.
//!
//! Glyph ids are preserved: glyphs that are not used keep their `loca`
//! slot with an empty outline, so `CIDToGIDMap /Identity`, `hmtx` and the
//! `W` array written for the CIDFont stay valid. Composite glyphs pull in
//! their components. Layout tables (`GSUB`, `GPOS`, `kern`, ...) and the
//! character map are dropped, since Identity-H text addresses glyphs
//! directly.

use std::collections::BTreeSet;

use md5::{Digest, Md5};

use super::collection::{read_tables, read_u16, read_u32, table_checksum, write_sfnt, Table};
use crate::error::{Error, Result};

/// Tables kept in the subset, in directory order.
const KEEP: [&[u8; 4]; 11] = [
    b"OS/2", b"cvt ", b"fpgm", b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp", b"name",
    b"prep",
];

const HEAD_CHECKSUM_ADJUSTMENT: usize = 8;
const HEAD_INDEX_TO_LOC_FORMAT: usize = 50;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

// Composite glyph component flags.
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

fn table<'a>(tables: &[Table<'a>], tag: &[u8; 4]) -> Result<&'a [u8]> {
    tables
        .iter()
        .find(|(t, _)| t == tag)
        .map(|(_, body)| *body)
        .ok_or_else(|| {
            Error::Font(format!(
                "font has no '{}' table",
                String::from_utf8_lossy(tag)
            ))
        })
}

fn parse_loca(loca: &[u8], num_glyphs: usize, long: bool) -> Result<Vec<usize>> {
    (0..=num_glyphs)
        .map(|i| {
            if long {
                read_u32(loca, i * 4).map(|v| v as usize)
            } else {
                read_u16(loca, i * 2).map(|v| v as usize * 2)
            }
        })
        .collect()
}

/// Outline bytes of `gid`; empty for glyphs without contours.
fn outline<'a>(glyf: &'a [u8], offsets: &[usize], gid: u16) -> Result<&'a [u8]> {
    let gid = gid as usize;
    let (start, end) = (offsets[gid], offsets[gid + 1]);
    if start >= end {
        return Ok(&glyf[..0]);
    }
    glyf.get(start..end)
        .ok_or_else(|| Error::Font(format!("glyph {} extends past 'glyf'", gid)))
}

/// Glyph ids referenced by a composite glyph; empty for simple glyphs.
fn components(glyph: &[u8]) -> Result<Vec<u16>> {
    if glyph.len() < 10 || (read_u16(glyph, 0)? as i16) >= 0 {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut pos = 10;
    loop {
        let flags = read_u16(glyph, pos)?;
        out.push(read_u16(glyph, pos + 2)?);
        pos += 4;
        pos += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            pos += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            pos += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            pos += 8;
        }
        if flags & MORE_COMPONENTS == 0 {
            return Ok(out);
        }
    }
}

/// Build a font program containing only the outlines of `used` glyphs
/// (plus `.notdef` and composite components).
pub fn subset(data: &[u8], used: impl IntoIterator<Item = u16>) -> Result<Vec<u8>> {
    let (sfnt_version, tables) = read_tables(data, 0)?;
    let head = table(&tables, b"head")?;
    let maxp = table(&tables, b"maxp")?;
    let loca = table(&tables, b"loca")?;
    let glyf = table(&tables, b"glyf")?;

    let long_loca = read_u16(head, HEAD_INDEX_TO_LOC_FORMAT)? != 0;
    let num_glyphs = read_u16(maxp, 4)? as usize;
    let offsets = parse_loca(loca, num_glyphs, long_loca)?;

    let mut keep: BTreeSet<u16> = used
        .into_iter()
        .filter(|gid| (*gid as usize) < num_glyphs)
        .collect();
    keep.insert(0);
    let mut pending: Vec<u16> = keep.iter().copied().collect();
    while let Some(gid) = pending.pop() {
        for component in components(outline(glyf, &offsets, gid)?)? {
            if (component as usize) < num_glyphs && keep.insert(component) {
                pending.push(component);
            }
        }
    }

    let mut new_glyf = Vec::new();
    let mut new_loca = Vec::with_capacity((num_glyphs + 1) * if long_loca { 4 } else { 2 });
    for gid in 0..=num_glyphs {
        let offset = new_glyf.len();
        if long_loca {
            new_loca.extend_from_slice(&(offset as u32).to_be_bytes());
        } else {
            new_loca.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        }
        if gid < num_glyphs && keep.contains(&(gid as u16)) {
            new_glyf.extend_from_slice(outline(glyf, &offsets, gid as u16)?);
            new_glyf.resize((new_glyf.len() + 3) & !3, 0);
        }
    }

    let mut new_head = head.to_vec();
    new_head[HEAD_CHECKSUM_ADJUSTMENT..HEAD_CHECKSUM_ADJUSTMENT + 4].fill(0);

    let mut kept: Vec<Table<'_>> = tables
        .iter()
        .filter(|(tag, _)| KEEP.contains(&tag))
        .map(|(tag, body)| match tag {
            b"glyf" => (*tag, new_glyf.as_slice()),
            b"loca" => (*tag, new_loca.as_slice()),
            b"head" => (*tag, new_head.as_slice()),
            _ => (*tag, *body),
        })
        .collect();
    kept.sort_by_key(|(tag, _)| *tag);

    let mut font = write_sfnt(sfnt_version, &kept);
    let head_at = head_offset(&font, kept.len())?;
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&font));
    font[head_at + HEAD_CHECKSUM_ADJUSTMENT..head_at + HEAD_CHECKSUM_ADJUSTMENT + 4]
        .copy_from_slice(&adjustment.to_be_bytes());

    log::debug!(
        "Subset font to {} of {} glyphs ({} -> {} bytes)",
        keep.len(),
        num_glyphs,
        data.len(),
        font.len()
    );
    Ok(font)
}

fn head_offset(font: &[u8], num_tables: usize) -> Result<usize> {
    (0..num_tables)
        .map(|i| 12 + i * 16)
        .find(|rec| font.get(*rec..*rec + 4) == Some(b"head".as_slice()))
        .map(|rec| read_u32(font, rec + 8).map(|v| v as usize))
        .unwrap_or_else(|| Err(Error::Font("subset has no 'head' table".into())))
}

/// Six-letter subset tag (`ABCDEF+`) derived from the glyph set, so
/// different subsets of one face get different names.
pub fn subset_tag(used: impl IntoIterator<Item = u16>) -> String {
    let mut digest = Md5::new();
    for gid in used {
        digest.update(gid.to_be_bytes());
    }
    digest.finalize()[..6]
        .iter()
        .map(|b| (b'A' + b % 26) as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::{Face, GlyphId};

    const DEJAVU: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/DejaVuSans.ttf"
    ));

    fn gid(face: &Face<'_>, c: char) -> u16 {
        face.glyph_index(c).unwrap().0
    }

    #[test]
    fn test_subset_keeps_used_outlines_only() {
        let original = Face::parse(DEJAVU, 0).unwrap();
        let a = gid(&original, 'A');
        let omega = gid(&original, 'Ω');
        let z = gid(&original, 'z');

        let font = subset(DEJAVU, [a, omega]).unwrap();
        assert!(font.len() < DEJAVU.len() / 4);

        let face = Face::parse(&font, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), original.number_of_glyphs());
        assert!(face.glyph_bounding_box(GlyphId(a)).is_some());
        assert!(face.glyph_bounding_box(GlyphId(omega)).is_some());
        assert!(face.glyph_bounding_box(GlyphId(z)).is_none());
        assert_eq!(
            face.glyph_hor_advance(GlyphId(z)),
            original.glyph_hor_advance(GlyphId(z))
        );
    }

    #[test]
    fn test_subset_drops_layout_tables() {
        let font = subset(DEJAVU, [36]).unwrap();
        let (_, tables) = read_tables(&font, 0).unwrap();
        let tags: Vec<&[u8; 4]> = tables.iter().map(|(t, _)| t).collect();
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
        assert!(tags.contains(&b"glyf"));
        assert!(!tags.contains(&b"GPOS"));
        assert!(!tags.contains(&b"cmap"));
    }

    #[test]
    fn test_subset_checksum_adjustment() {
        let font = subset(DEJAVU, [36, 37]).unwrap();
        assert_eq!(table_checksum(&font), CHECKSUM_MAGIC);
    }

    #[test]
    fn test_composite_components() {
        // numberOfContours = -1, bbox, then two components: one with word
        // args and a scale, one with byte args.
        let mut glyph = vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
        let flags = ARG_1_AND_2_ARE_WORDS | WE_HAVE_A_SCALE | MORE_COMPONENTS;
        glyph.extend_from_slice(&flags.to_be_bytes());
        glyph.extend_from_slice(&7u16.to_be_bytes());
        glyph.extend_from_slice(&[0, 1, 0, 2, 0x40, 0]);
        glyph.extend_from_slice(&0u16.to_be_bytes());
        glyph.extend_from_slice(&42u16.to_be_bytes());
        glyph.extend_from_slice(&[3, 4]);

        assert_eq!(components(&glyph).unwrap(), vec![7, 42]);
        assert!(components(&[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap().is_empty());
        assert!(components(&glyph[..14]).is_err());
    }

    #[test]
    fn test_subset_tag() {
        let tag = subset_tag([3, 4, 5]);
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_uppercase()));
        assert_eq!(tag, subset_tag([3, 4, 5]));
        assert_ne!(tag, subset_tag([3, 4, 6]));
    }

    #[test]
    fn test_rejects_font_without_outlines() {
        let tables: Vec<Table<'_>> = vec![(*b"head", &[0u8; 54][..])];
        let font = write_sfnt(0x0001_0000, &tables);
        assert!(matches!(subset(&font, [1]), Err(Error::Font(_))));
    }
}
