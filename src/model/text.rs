//! Text block types.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A segment of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block kind
    #[serde(rename = "type")]
    pub kind: TextBlockKind,

    /// Section or heading title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Block text
    pub content: String,

    /// Heading level (0 when not a heading)
    pub level: u32,

    /// Bounding box, for blocks from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    /// Page index, for blocks from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TextBlock {
    /// Create a block.
    pub fn new(kind: TextBlockKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            content: content.into(),
            level: 0,
            bbox: None,
            page: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the heading level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Record the position on a page.
    pub fn with_position(mut self, bbox: Option<BBox>, page: u32) -> Self {
        self.bbox = bbox;
        self.page = Some(page);
        self
    }
}

/// Kind of text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBlockKind {
    /// Heading line
    Heading,
    /// Paragraph
    Paragraph,
    /// Bulleted list
    List,
    /// Block quote
    Quote,
    /// Heading-delimited section
    Section,
    /// Untyped text item
    Text,
}

/// Aggregate text result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResult {
    /// Full (cleaned) markdown text
    pub full_text: String,

    /// Segmented blocks
    #[serde(rename = "textBlocks")]
    pub blocks: Vec<TextBlock>,

    /// Frequent terms
    pub keywords: Vec<String>,

    /// Overall confidence (0-100)
    pub confidence: f64,

    /// Size statistics
    pub stats: TextStats,
}

/// Text size statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Character count
    pub characters: usize,
    /// Whitespace-separated token count
    pub words: usize,
    /// Line count
    pub lines: usize,
    /// Page count
    pub pages: usize,
}

impl TextStats {
    /// Compute statistics for a text.
    pub fn from_text(text: &str, pages: usize) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: if text.is_empty() { 0 } else { text.lines().count() },
            pages,
        }
    }
}
