//! Document model types for normalized OCR content.
//!
//! Input types ([`ContentItem`], [`LayoutReport`], [`AssetMap`]) describe what
//! the OCR backends hand us. Output types ([`UnifiedDocument`] and its records)
//! are what the extraction pipeline produces, and serialize to the JSON shape
//! consumed by the front end.

mod content_item;
mod document;
mod formula;
mod image;
mod table;
mod text;

pub use content_item::{
    bbox_from_value, content_items_from_value, BBox, ContentItem, ContentKind, LayoutBlock,
    LayoutPage, LayoutReport,
};
pub use document::{
    ContentType, DocumentMetadata, ExtractionMode, HandwrittenResult, PerformanceHint,
    UnifiedDocument,
};
pub use formula::{FormulaKind, FormulaRecord};
pub use image::{bytes_to_data_uri, to_data_uri, AssetDescriptor, AssetMap, ImageAsset, ImageRecord};
pub use table::{TableRecord, TableSource};
pub use text::{TextBlock, TextBlockKind, TextResult, TextStats};
