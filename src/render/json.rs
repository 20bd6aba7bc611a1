//! JSON rendering for extracted documents.

use crate::error::{Error, Result};
use crate::model::UnifiedDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to a JSON string.
pub fn to_json(doc: &UnifiedDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert a document to a JSON value.
pub fn to_json_value(doc: &UnifiedDocument) -> Result<serde_json::Value> {
    serde_json::to_value(doc).map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextBlock, TextBlockKind};

    fn sample() -> UnifiedDocument {
        let mut doc = UnifiedDocument::default();
        doc.text.full_text = "Hello".to_string();
        doc.text
            .blocks
            .push(TextBlock::new(TextBlockKind::Paragraph, "Hello"));
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"fullText\""));
        assert!(json.contains("\"textBlocks\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_to_json_value_wire_names() {
        let value = to_json_value(&sample()).unwrap();
        assert!(value.get("handwritten").is_some());
        assert!(value.get("performance").is_some());
        assert_eq!(value["text"]["textBlocks"][0]["type"], "paragraph");
        assert!(value["metadata"].get("totalElements").is_some());
    }
}
