//! Extracting one face from a TrueType collection (`.ttc`).
//!
//! PDF can only embed a single sfnt, so the selected face's table directory
//! is rebuilt with its tables copied into a standalone font file.

use crate::error::{Error, Result};

const TTC_TAG: &[u8; 4] = b"ttcf";
const TABLE_RECORD_LEN: usize = 16;
const SFNT_HEADER_LEN: usize = 12;

pub(super) fn read_u16(data: &[u8], pos: usize) -> Result<u16> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| Error::Font("truncated font file".into()))
}

pub(super) fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::Font("truncated font file".into()))
}

/// A table tag and its body.
pub(super) type Table<'a> = ([u8; 4], &'a [u8]);

/// Whether `data` is a font collection.
pub fn is_collection(data: &[u8]) -> bool {
    data.starts_with(TTC_TAG)
}

/// Number of faces in a collection, or 1 for a plain font.
pub fn face_count(data: &[u8]) -> u32 {
    if is_collection(data) {
        read_u32(data, 8).unwrap_or(0)
    } else {
        1
    }
}

/// Return a standalone sfnt for face `index`.
///
/// Plain fonts are returned unchanged for index 0.
pub fn extract_face(data: &[u8], index: u32) -> Result<Vec<u8>> {
    if !is_collection(data) {
        if index != 0 {
            return Err(Error::Font(format!(
                "face index {} requested from a single-face font",
                index
            )));
        }
        return Ok(data.to_vec());
    }

    let count = read_u32(data, 8)?;
    if index >= count {
        return Err(Error::Font(format!(
            "face index {} out of range; collection has {} face(s)",
            index, count
        )));
    }

    let offset = read_u32(data, 12 + 4 * index as usize)? as usize;
    let (sfnt_version, tables) = read_tables(data, offset)?;
    Ok(write_sfnt(sfnt_version, &tables))
}

/// Read the table directory of the sfnt starting at `offset`. Table
/// offsets are absolute within `data`, as in both plain fonts and
/// collections.
pub(super) fn read_tables(data: &[u8], offset: usize) -> Result<(u32, Vec<Table<'_>>)> {
    let sfnt_version = read_u32(data, offset)?;
    let num_tables = read_u16(data, offset + 4)? as usize;

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let rec = offset + SFNT_HEADER_LEN + i * TABLE_RECORD_LEN;
        let tag: [u8; 4] = data
            .get(rec..rec + 4)
            .and_then(|t| t.try_into().ok())
            .ok_or_else(|| Error::Font("truncated table directory".into()))?;
        let start = read_u32(data, rec + 8)? as usize;
        let len = read_u32(data, rec + 12)? as usize;
        let body = data
            .get(start..start + len)
            .ok_or_else(|| Error::Font("table extends past end of font".into()))?;
        tables.push((tag, body));
    }
    Ok((sfnt_version, tables))
}

/// Sum of big-endian words, the last one zero-padded.
pub(super) fn table_checksum(body: &[u8]) -> u32 {
    body.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Serialize a standalone sfnt with the tables in the given order.
pub(super) fn write_sfnt(sfnt_version: u32, tables: &[Table<'_>]) -> Vec<u8> {
    let num_tables = tables.len();
    let mut entry_selector = 0u16;
    while (2usize << entry_selector) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (16usize << entry_selector) as u16;
    let range_shift = ((num_tables * 16) as u16).saturating_sub(search_range);

    let dir_len = SFNT_HEADER_LEN + num_tables * TABLE_RECORD_LEN;
    let body_len: usize = tables.iter().map(|(_, b)| (b.len() + 3) & !3).sum();
    let mut out = Vec::with_capacity(dir_len + body_len);

    out.extend_from_slice(&sfnt_version.to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut next = dir_len;
    for (tag, body) in tables {
        out.extend_from_slice(tag);
        out.extend_from_slice(&table_checksum(body).to_be_bytes());
        out.extend_from_slice(&(next as u32).to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        next += (body.len() + 3) & !3;
    }
    for (_, body) in tables {
        out.extend_from_slice(body);
        out.resize((out.len() + 3) & !3, 0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal sfnt with the given tables, placed at `base` within a
    /// larger buffer so table offsets are absolute.
    fn sfnt_at(base: usize, tables: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        out.extend_from_slice(&[0, 16, 0, 0, 0, 0]);
        let mut next = base + 12 + tables.len() * 16;
        for (tag, body) in tables {
            out.extend_from_slice(tag.as_bytes());
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&(next as u32).to_be_bytes());
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            next += (body.len() + 3) & !3;
        }
        for (_, body) in tables {
            out.extend_from_slice(body.as_bytes());
            out.resize((out.len() + 3) & !3, 0);
        }
        out
    }

    fn collection(faces: &[Vec<(&str, &str)>]) -> Vec<u8> {
        let header_len = 12 + 4 * faces.len();
        let mut blobs = Vec::new();
        let mut offsets = Vec::new();
        let mut pos = header_len;
        for face in faces {
            let blob = sfnt_at(pos, face);
            offsets.push(pos as u32);
            pos += blob.len();
            blobs.push(blob);
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"ttcf");
        out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        out.extend_from_slice(&(faces.len() as u32).to_be_bytes());
        for off in offsets {
            out.extend_from_slice(&off.to_be_bytes());
        }
        for blob in blobs {
            out.extend_from_slice(&blob);
        }
        out
    }

    #[test]
    fn test_extract_second_face() {
        let ttc = collection(&[
            vec![("head", "AAAA"), ("glyf", "BB")],
            vec![("head", "CCCC"), ("glyf", "DDDDDD")],
        ]);
        assert!(is_collection(&ttc));
        assert_eq!(face_count(&ttc), 2);

        let face = extract_face(&ttc, 1).unwrap();
        assert_eq!(read_u16(&face, 4).unwrap(), 2);
        let first_off = read_u32(&face, 12 + 8).unwrap() as usize;
        assert_eq!(first_off, 12 + 2 * 16);
        assert_eq!(&face[first_off..first_off + 4], b"CCCC");
        let second_off = read_u32(&face, 12 + 16 + 8).unwrap() as usize;
        assert_eq!(&face[second_off..second_off + 6], b"DDDDDD");
        assert_eq!(face.len() % 4, 0);
    }

    #[test]
    fn test_face_index_out_of_range() {
        let ttc = collection(&[vec![("head", "AAAA")]]);
        assert!(extract_face(&ttc, 3).is_err());
    }

    #[test]
    fn test_plain_font_passthrough() {
        let ttf = sfnt_at(0, &[("head", "AAAA")]);
        assert_eq!(extract_face(&ttf, 0).unwrap(), ttf);
        assert!(extract_face(&ttf, 1).is_err());
        assert_eq!(face_count(&ttf), 1);
    }

    #[test]
    fn test_directory_search_fields() {
        let tables: Vec<Table<'_>> = vec![
            (*b"cmap", b"1".as_slice()),
            (*b"glyf", b"22".as_slice()),
            (*b"head", b"333".as_slice()),
            (*b"loca", b"4444".as_slice()),
            (*b"maxp", b"55555".as_slice()),
        ];
        let font = write_sfnt(0x0001_0000, &tables);
        assert_eq!(read_u16(&font, 4).unwrap(), 5);
        // searchRange, entrySelector, rangeShift for five tables
        assert_eq!(read_u16(&font, 6).unwrap(), 64);
        assert_eq!(read_u16(&font, 8).unwrap(), 2);
        assert_eq!(read_u16(&font, 10).unwrap(), 16);

        let (version, parsed) = read_tables(&font, 0).unwrap();
        assert_eq!(version, 0x0001_0000);
        assert_eq!(parsed, tables);
    }

    #[test]
    fn test_table_checksum_pads_last_word() {
        assert_eq!(table_checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(table_checksum(&[1]), 0x0100_0000);
        assert_eq!(table_checksum(&[]), 0);
    }

    #[test]
    fn test_truncated_collection() {
        let mut ttc = collection(&[vec![("head", "AAAA")]]);
        ttc.truncate(20);
        assert!(extract_face(&ttc, 0).is_err());
    }
}
