//! Formula types.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A math formula found in OCR output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecord {
    /// Identifier (e.g. "formula_inline_1")
    pub id: String,

    /// Inline or block
    #[serde(rename = "type")]
    pub kind: FormulaKind,

    /// Formula source without delimiters
    #[serde(rename = "formula")]
    pub raw_formula: String,

    /// Human-readable description
    pub description: String,

    /// Detection confidence (0-100)
    pub confidence: f64,

    /// Byte offset of the match in the markdown
    #[serde(rename = "position", default, skip_serializing_if = "Option::is_none")]
    pub char_offset: Option<usize>,

    /// Bounding box, for formulas from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    /// Page index, for formulas from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl FormulaRecord {
    /// Create a formula record.
    pub fn new(
        id: impl Into<String>,
        kind: FormulaKind,
        raw_formula: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            raw_formula: raw_formula.into(),
            description: kind.description().to_string(),
            confidence: confidence.clamp(0.0, 100.0),
            char_offset: None,
            bbox: None,
            page: None,
        }
    }

    /// Record the markdown offset.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.char_offset = Some(offset);
        self
    }

    /// Record the position on a page.
    pub fn with_position(mut self, bbox: Option<BBox>, page: u32) -> Self {
        self.bbox = bbox;
        self.page = Some(page);
        self
    }
}

/// Formula display kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaKind {
    /// `$...$`
    Inline,
    /// `$$...$$`
    Block,
}

impl FormulaKind {
    /// Default description text.
    pub fn description(&self) -> &'static str {
        match self {
            FormulaKind::Inline => "Inline formula",
            FormulaKind::Block => "Block formula",
        }
    }
}
