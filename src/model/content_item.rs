//! Positioned content items and the structural layout report.
//!
//! Both come from upstream OCR backends as loosely-typed JSON, so parsing is
//! lenient: malformed fields are dropped instead of failing the whole list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Bounding box `[x_min, y_min, x_max, y_max]`.
pub type BBox = [f64; 4];

/// One positioned element reported by an OCR backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    /// Free-form type tag (e.g. "text", "title", "table", "image")
    #[serde(rename = "type")]
    pub item_type: String,

    /// Recognized text
    pub text: String,

    /// Bounding box in the backend's content space
    pub bbox: Option<BBox>,

    /// Zero-based page index
    pub page_idx: u32,

    /// Reference path of the image asset, for image items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_path: Option<String>,
}

impl ContentItem {
    /// Create a content item.
    pub fn new(item_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            text: text.into(),
            bbox: None,
            page_idx: 0,
            img_path: None,
        }
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the page index.
    pub fn with_page(mut self, page_idx: u32) -> Self {
        self.page_idx = page_idx;
        self
    }

    /// Set the image reference path.
    pub fn with_img_path(mut self, path: impl Into<String>) -> Self {
        self.img_path = Some(path.into());
        self
    }

    /// Classify the free-form type tag.
    pub fn kind(&self) -> ContentKind {
        ContentKind::parse(&self.item_type)
    }

    /// Build an item from a JSON value, or `None` if it is not an object.
    ///
    /// Wrong-typed fields fall back to their defaults.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let item_type = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let bbox = obj.get("bbox").and_then(bbox_from_value);
        let page_idx = obj
            .get("page_idx")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0);
        let img_path = obj
            .get("img_path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Some(Self {
            item_type,
            text,
            bbox,
            page_idx,
            img_path,
        })
    }
}

impl<'de> Deserialize<'de> for ContentItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ContentItem::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("content item must be a JSON object"))
    }
}

/// Parse a content list, skipping entries that are not objects.
///
/// A value that is not an array yields an empty list.
pub fn content_items_from_value(value: &Value) -> Vec<ContentItem> {
    let Some(entries) = value.as_array() else {
        log::warn!("content list is not an array, ignoring it");
        return Vec::new();
    };

    let items: Vec<ContentItem> = entries.iter().filter_map(ContentItem::from_value).collect();
    if items.len() < entries.len() {
        log::warn!(
            "skipped {} malformed content list entries",
            entries.len() - items.len()
        );
    }
    items
}

/// Parse a bounding box: an array of exactly four finite numbers.
pub fn bbox_from_value(value: &Value) -> Option<BBox> {
    let arr = value.as_array()?;
    if arr.len() != 4 {
        return None;
    }

    let mut bbox = [0.0; 4];
    for (slot, v) in bbox.iter_mut().zip(arr) {
        let n = v.as_f64()?;
        if !n.is_finite() {
            return None;
        }
        *slot = n;
    }
    Some(bbox)
}

/// Closed classification of a content item's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Table region
    Table,
    /// Image or figure
    Image,
    /// Formula or equation
    Formula,
    /// Text, title or paragraph
    Text,
    /// Anything else (headers, footers, page numbers, ...)
    Unknown,
}

impl ContentKind {
    /// Classify a type tag by case-insensitive substring match.
    ///
    /// Checked in order: table, image/figure, formula/equation,
    /// text/title/paragraph.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        if tag.contains("table") {
            ContentKind::Table
        } else if tag.contains("image") || tag.contains("figure") {
            ContentKind::Image
        } else if tag.contains("formula") || tag.contains("equation") {
            ContentKind::Formula
        } else if tag.contains("text") || tag.contains("title") || tag.contains("paragraph") {
            ContentKind::Text
        } else {
            ContentKind::Unknown
        }
    }
}

/// Structural report of the page layout (MinerU's "middle json").
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutReport {
    /// Per-page layout information
    pub pdf_info: Vec<LayoutPage>,
}

impl LayoutReport {
    /// Get the layout of a page by zero-based index.
    ///
    /// Prefers an explicit `page_idx` match, then falls back to position.
    pub fn page(&self, page_idx: u32) -> Option<&LayoutPage> {
        self.pdf_info
            .iter()
            .find(|p| p.page_idx == Some(page_idx))
            .or_else(|| {
                self.pdf_info
                    .get(page_idx as usize)
                    .filter(|p| p.page_idx.is_none())
            })
    }

    /// Number of pages in the report.
    pub fn page_count(&self) -> usize {
        self.pdf_info.len()
    }

    /// Build a report from JSON; anything unrecognized becomes an empty report.
    pub fn from_value(value: &Value) -> Self {
        let pages = value
            .get("pdf_info")
            .and_then(Value::as_array)
            .map(|pages| pages.iter().filter_map(LayoutPage::from_value).collect())
            .unwrap_or_default();
        Self { pdf_info: pages }
    }
}

impl<'de> Deserialize<'de> for LayoutReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(LayoutReport::from_value(&value))
    }
}

/// Layout information for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutPage {
    /// Zero-based page index, when reported
    pub page_idx: Option<u32>,
    /// Page width in PDF points
    pub width: Option<f64>,
    /// Page height in PDF points
    pub height: Option<f64>,
    /// Pre-processed layout blocks in layout space
    pub preproc_blocks: Vec<LayoutBlock>,
}

impl LayoutPage {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let mut width = None;
        let mut height = None;
        if let Some(size) = obj.get("page_size").and_then(Value::as_array) {
            width = size.first().and_then(Value::as_f64);
            height = size.get(1).and_then(Value::as_f64);
        }
        width = obj.get("width").and_then(Value::as_f64).or(width);
        height = obj.get("height").and_then(Value::as_f64).or(height);

        let preproc_blocks = obj
            .get("preproc_blocks")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().filter_map(LayoutBlock::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            page_idx: obj
                .get("page_idx")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok()),
            width,
            height,
            preproc_blocks,
        })
    }

    /// Page size in PDF points if both dimensions are known and positive.
    pub fn size(&self) -> Option<(f64, f64)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w, h)),
            _ => None,
        }
    }

    /// First block that carries a bounding box.
    pub fn first_bbox(&self) -> Option<BBox> {
        self.preproc_blocks.iter().find_map(|b| b.bbox)
    }
}

/// One block of the layout report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutBlock {
    /// Block type tag
    #[serde(rename = "type")]
    pub block_type: String,
    /// Bounding box in layout space
    pub bbox: Option<BBox>,
}

impl LayoutBlock {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            block_type: obj
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            bbox: obj.get("bbox").and_then(bbox_from_value),
        })
    }
}
