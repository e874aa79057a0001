//! Standard 14 Helvetica with WinAnsi encoding.

use lopdf::{dictionary, Dictionary};

/// cp1252 code points 0x80..=0x9F. Zero marks an unassigned code.
const CP1252_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

/// Map one character to its WinAnsi code.
pub fn winansi_code(c: char) -> Option<u8> {
    let cp = c as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp as u8),
        _ => CP1252_HIGH
            .iter()
            .position(|&x| x != 0 && x == cp)
            .map(|i| 0x80 + i as u8),
    }
}

/// Encode `text` as WinAnsi bytes. Tabs and newlines become spaces and any
/// other unencodable character becomes `?`.
pub fn encode_winansi(text: &str) -> (Vec<u8>, usize) {
    let mut lost = 0;
    let bytes = text
        .chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            _ => winansi_code(c).unwrap_or_else(|| {
                lost += 1;
                b'?'
            }),
        })
        .collect();
    (bytes, lost)
}

/// Font dictionary for the builtin font.
pub fn font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_and_latin1() {
        assert_eq!(encode_winansi("Abc é"), (vec![b'A', b'b', b'c', b' ', 0xE9], 0));
    }

    #[test]
    fn test_cp1252_specials() {
        assert_eq!(winansi_code('€'), Some(0x80));
        assert_eq!(winansi_code('—'), Some(0x97));
        assert_eq!(winansi_code('Ÿ'), Some(0x9F));
        assert_eq!(winansi_code('\u{81}'), None);
    }

    #[test]
    fn test_unencodable_becomes_question_mark() {
        let (bytes, lost) = encode_winansi("日本a");
        assert_eq!(bytes, b"??a".to_vec());
        assert_eq!(lost, 2);
    }
}
