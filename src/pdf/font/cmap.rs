//! ToUnicode CMap generation for Identity-H fonts.

use std::fmt::Write;

/// Entries per `beginbfchar` block; the CMap format caps blocks at 100.
const BLOCK: usize = 100;

fn utf16_hex(text: &str) -> String {
    text.encode_utf16().fold(String::new(), |mut out, unit| {
        let _ = write!(out, "{:04X}", unit);
        out
    })
}

/// Build a ToUnicode CMap mapping two-byte glyph codes to text.
///
/// `mappings` must be sorted by glyph id; each glyph maps to the text it
/// was first used for.
pub fn to_unicode_cmap(mappings: &[(u16, String)]) -> String {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    for block in mappings.chunks(BLOCK) {
        let _ = writeln!(out, "{} beginbfchar", block.len());
        for (gid, text) in block {
            let _ = writeln!(out, "<{:04X}> <{}>", gid, utf16_hex(text));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    out
}
