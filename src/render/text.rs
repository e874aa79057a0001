//! Plain-text dump of recognized page text.

use crate::model::PageText;

/// Render pages as plain text.
///
/// Each page becomes a `--- Page: <file> ---` header followed by its region
/// texts, one per line, and a blank line.
pub fn to_text(pages: &[PageText]) -> String {
    let mut output = String::new();
    for page in pages {
        output.push_str("--- Page: ");
        output.push_str(&page.filename);
        output.push_str(" ---\n");
        output.push_str(&page.content());
        output.push_str("\n\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text() {
        let pages = vec![
            PageText::new("p1.png", vec!["Hello".into(), "world".into()]),
            PageText::new("p2.png", vec![]),
        ];
        assert_eq!(
            to_text(&pages),
            "--- Page: p1.png ---\nHello\nworld\n\n--- Page: p2.png ---\n\n\n"
        );
    }

    #[test]
    fn test_empty() {
        assert!(to_text(&[]).is_empty());
    }
}
