//! JSON export of recognized page text.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::PageText;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    page_count: usize,
    pages: Vec<JsonPage<'a>>,
}

#[derive(Serialize)]
struct JsonPage<'a> {
    number: usize,
    filename: &'a str,
    text: String,
    lines: &'a [String],
}

/// Convert pages to JSON.
pub fn to_json(pages: &[PageText], title: Option<&str>, format: JsonFormat) -> Result<String> {
    let doc = JsonDocument {
        title,
        page_count: pages.len(),
        pages: pages
            .iter()
            .enumerate()
            .map(|(i, page)| JsonPage {
                number: i + 1,
                filename: &page.filename,
                text: page.content(),
                lines: &page.lines,
            })
            .collect(),
    };

    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&doc),
        JsonFormat::Compact => serde_json::to_string(&doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<PageText> {
        vec![
            PageText::new("p1.png", vec!["一行目".into(), "second".into()]),
            PageText::new("p2.png", vec![]),
        ]
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&pages(), Some("Scans"), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\": \"Scans\""));
        assert!(json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["pages"][0]["text"], "一行目\nsecond");
        assert_eq!(value["pages"][1]["number"], 2);
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&pages(), None, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(!json.contains("title"));
    }
}
