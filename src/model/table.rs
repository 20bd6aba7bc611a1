//! Table types.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A table recognized in OCR output.
///
/// Every row has exactly `headers.len()` cells. Rows that do not are dropped
/// when the record is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    /// Identifier, namespaced by strategy (e.g. "table_pipe_1")
    pub id: String,

    /// Display title
    pub title: String,

    /// Header cells
    pub headers: Vec<String>,

    /// Data rows
    pub rows: Vec<Vec<String>>,

    /// Number of data rows
    pub row_count: usize,

    /// Number of columns
    pub column_count: usize,

    /// Detection confidence (0-100)
    pub confidence: f64,

    /// Strategy that produced this table
    #[serde(rename = "source")]
    pub source_strategy: TableSource,

    /// Original HTML markup, for HTML tables
    #[serde(rename = "html", default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,

    /// Bounding box, for tables from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    /// Page index, for tables from content items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TableRecord {
    /// Build a table, dropping rows whose width differs from the header.
    ///
    /// Returns `None` when there are no headers or no valid rows left.
    pub fn build(
        id: impl Into<String>,
        title: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        confidence: f64,
        source: TableSource,
    ) -> Option<Self> {
        if headers.is_empty() {
            return None;
        }

        let width = headers.len();
        let total = rows.len();
        let rows: Vec<Vec<String>> = rows.into_iter().filter(|r| r.len() == width).collect();
        if rows.len() < total {
            log::debug!(
                "{} table: dropped {} rows not matching {} columns",
                source,
                total - rows.len(),
                width
            );
        }
        if rows.is_empty() {
            return None;
        }

        Some(Self {
            id: id.into(),
            title: title.into(),
            row_count: rows.len(),
            column_count: width,
            headers,
            rows,
            confidence: confidence.clamp(0.0, 100.0),
            source_strategy: source,
            raw_html: None,
            bbox: None,
            page: None,
        })
    }

    /// Attach the original HTML.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.raw_html = Some(html.into());
        self
    }

    /// Attach position information.
    pub fn with_position(mut self, bbox: Option<BBox>, page: u32) -> Self {
        self.bbox = bbox;
        self.page = Some(page);
        self
    }

    /// Check if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tab-separated plain text, header first.
    pub fn plain_text(&self) -> String {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Strategy that produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    /// Markdown pipe table
    Pipe,
    /// HTML `<table>` markup
    Html,
    /// Box-drawing ASCII art
    Ascii,
    /// Whitespace-aligned columns
    Grid,
    /// Table content item from a structured backend
    ContentItem,
}

impl TableSource {
    /// Fixed confidence ceiling for this strategy.
    pub fn confidence(&self) -> f64 {
        match self {
            TableSource::Pipe => 95.0,
            TableSource::Html => 90.0,
            TableSource::Ascii => 85.0,
            TableSource::Grid => 80.0,
            TableSource::ContentItem => 90.0,
        }
    }

    /// Identifier namespace.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TableSource::Pipe => "table_pipe",
            TableSource::Html => "table_html",
            TableSource::Ascii => "table_ascii",
            TableSource::Grid => "table_grid",
            TableSource::ContentItem => "table",
        }
    }
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSource::Pipe => write!(f, "pipe"),
            TableSource::Html => write!(f, "html"),
            TableSource::Ascii => write!(f, "ascii"),
            TableSource::Grid => write!(f, "grid"),
            TableSource::ContentItem => write!(f, "content_item"),
        }
    }
}
