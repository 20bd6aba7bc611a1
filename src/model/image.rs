//! Image references and image assets.

use super::BBox;
use crate::detect;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from an image reference path to its pixel data.
pub type AssetMap = HashMap<String, ImageAsset>;

/// An image referenced by OCR output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Identifier (e.g. "md_image_1")
    pub id: String,

    /// Free-form kind tag ("markdown", "html", "reference", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Reference path (asset map key)
    pub path: String,

    /// Pixel data as a `data:` URI
    #[serde(rename = "base64", default)]
    pub pixel_data: Option<String>,

    /// Alternative text
    pub alt_text: String,

    /// Description
    pub description: String,

    /// Detection confidence (0-100)
    pub confidence: f64,

    /// Bounding box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    /// Page index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Byte offset of the reference in the markdown
    #[serde(rename = "position", default, skip_serializing_if = "Option::is_none")]
    pub char_offset: Option<usize>,
}

impl ImageRecord {
    /// Create an image record without pixel data.
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        path: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            path: path.into(),
            pixel_data: None,
            alt_text: String::new(),
            description: String::new(),
            confidence: confidence.clamp(0.0, 100.0),
            bbox: None,
            page: None,
            char_offset: None,
        }
    }

    /// Set alt text and description.
    pub fn with_text(mut self, alt_text: impl Into<String>, description: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self.description = description.into();
        self
    }

    /// Record the markdown offset.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.char_offset = Some(offset);
        self
    }

    /// Record the position on a page.
    pub fn with_position(mut self, bbox: Option<BBox>, page: Option<u32>) -> Self {
        self.bbox = bbox;
        self.page = page;
        self
    }

    /// Whether pixel data has been attached.
    pub fn has_pixels(&self) -> bool {
        self.pixel_data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Value of an asset map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageAsset {
    /// Base64 pixel data, bare or as a `data:` URI
    Encoded(String),
    /// Richer descriptor supplied by the backend
    Described(AssetDescriptor),
}

impl ImageAsset {
    /// Encode raw image bytes, sniffing the MIME type.
    pub fn from_bytes(data: &[u8]) -> Self {
        ImageAsset::Encoded(bytes_to_data_uri(data))
    }

    /// Pixel data as a `data:` URI, if any.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            ImageAsset::Encoded(encoded) if !encoded.trim().is_empty() => {
                Some(to_data_uri(encoded))
            }
            ImageAsset::Encoded(_) => None,
            ImageAsset::Described(desc) => desc
                .base64
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(to_data_uri),
        }
    }
}

/// Structured asset descriptor; every field overrides the generated default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Kind tag
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    /// Confidence (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Replacement path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Pixel data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

const DATA_URI_PREFIX: &str = "data:";

/// Wrap base64 pixel data as a PNG `data:` URI unless it already is a URI.
pub fn to_data_uri(encoded: &str) -> String {
    let encoded = encoded.trim();
    if encoded.starts_with(DATA_URI_PREFIX) {
        encoded.to_string()
    } else {
        format!("data:image/png;base64,{}", encoded)
    }
}

/// Encode raw image bytes as a `data:` URI.
pub fn bytes_to_data_uri(data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        detect::image_mime_type(data),
        BASE64.encode(data)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_data_uri() {
        assert_eq!(to_data_uri("iVBORw0"), "data:image/png;base64,iVBORw0");
        assert_eq!(
            to_data_uri("data:image/jpeg;base64,/9j/"),
            "data:image/jpeg;base64,/9j/"
        );
    }

    #[test]
    fn test_asset_from_bytes() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let asset = ImageAsset::from_bytes(&jpeg);
        let uri = asset.data_uri().unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_asset_untagged_deserialize() {
        let assets: AssetMap = serde_json::from_str(
            r#"{
                "a.png": "iVBORw0KGgo",
                "b.png": { "type": "chart", "altText": "Sales", "confidence": 70 }
            }"#,
        )
        .unwrap();

        assert_eq!(assets["a.png"], ImageAsset::Encoded("iVBORw0KGgo".into()));
        match &assets["b.png"] {
            ImageAsset::Described(desc) => {
                assert_eq!(desc.kind.as_deref(), Some("chart"));
                assert_eq!(desc.alt_text.as_deref(), Some("Sales"));
                assert_eq!(desc.confidence, Some(70.0));
                assert!(desc.base64.is_none());
            }
            other => panic!("expected descriptor, got {:?}", other),
        }
        assert!(assets["b.png"].data_uri().is_none());
    }

    #[test]
    fn test_empty_encoded_has_no_pixels() {
        assert!(ImageAsset::Encoded("  ".into()).data_uri().is_none());
    }

    #[test]
    fn test_record_wire_names() {
        let record = ImageRecord::new("md_image_1", "markdown", "img.png", 95.0)
            .with_text("alt", "alt")
            .at_offset(0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "markdown");
        assert_eq!(json["altText"], "alt");
        assert_eq!(json["base64"], serde_json::Value::Null);
        assert_eq!(json["position"], 0);
        assert!(!record.has_pixels());
    }
}
