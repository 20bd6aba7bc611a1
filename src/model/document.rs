//! Document-level types.

use super::{FormulaRecord, ImageRecord, TableRecord, TextResult};
use serde::{Deserialize, Serialize};

/// The normalized result of one extraction call.
///
/// Owned entirely by the caller; the engine keeps nothing after returning it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDocument {
    /// Text, blocks and keywords
    pub text: TextResult,

    /// Tables
    pub tables: Vec<TableRecord>,

    /// Formulas
    pub formulas: Vec<FormulaRecord>,

    /// Images
    pub images: Vec<ImageRecord>,

    /// Handwriting detection (no backend reports it)
    #[serde(rename = "handwritten")]
    pub handwritten_flag: HandwrittenResult,

    /// Performance summary
    #[serde(rename = "performance")]
    pub performance_hint: PerformanceHint,

    /// Processing metadata
    pub metadata: DocumentMetadata,
}

impl UnifiedDocument {
    /// Total number of tables, formulas, images and text blocks.
    pub fn element_count(&self) -> usize {
        self.text.blocks.len() + self.tables.len() + self.formulas.len() + self.images.len()
    }

    /// Content categories present, in fixed order; `[Text]` when none are.
    pub fn content_types(&self) -> Vec<ContentType> {
        let mut types = Vec::new();
        if !self.text.blocks.is_empty() {
            types.push(ContentType::Text);
        }
        if !self.tables.is_empty() {
            types.push(ContentType::Tables);
        }
        if !self.formulas.is_empty() {
            types.push(ContentType::Formulas);
        }
        if !self.images.is_empty() {
            types.push(ContentType::Images);
        }
        if types.is_empty() {
            types.push(ContentType::Text);
        }
        types
    }

    /// Images that carry pixel data.
    pub fn resolved_images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.iter().filter(|img| img.has_pixels())
    }
}

/// Handwriting detection result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandwrittenResult {
    /// Whether handwriting was detected
    pub detected: bool,
    /// Description of the detected content
    pub text: String,
    /// Detection confidence
    pub confidence: f64,
    /// Handwritten areas
    pub areas: Vec<serde_json::Value>,
}

/// Performance summary reported with the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceHint {
    /// Recognition accuracy estimate (%)
    pub accuracy: f64,
    /// Processing time in seconds
    pub speed: f64,
    /// Memory usage in MB (0 when not measured)
    pub memory: u64,
}

/// Processing metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Number of elements considered
    pub total_elements: usize,

    /// Content categories present
    #[serde(rename = "contentTypes")]
    pub content_type_tags: Vec<ContentType>,

    /// Processing time in seconds
    pub processing_time: Option<f64>,

    /// Extraction mode that produced the document
    #[serde(default)]
    pub mode: ExtractionMode,
}

/// Content category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Text blocks
    Text,
    /// Tables
    Tables,
    /// Formulas
    Formulas,
    /// Images
    Images,
}

/// Which extraction path produced a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Driven by an ordered content-item list
    Structured,
    /// Pattern matching over raw markdown
    #[default]
    Fallback,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Structured => write!(f, "structured"),
            ExtractionMode::Fallback => write!(f, "fallback"),
        }
    }
}
