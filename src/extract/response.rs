//! Decoding of whole OCR backend responses.
//!
//! Backends are inconsistent about shape: the structured fields may arrive as
//! nested JSON or as JSON-encoded strings, MinerU wraps each document in a
//! `results` map keyed by file name, and PaddleOCR returns one markdown page
//! per entry of `result.layoutParsingResults`. Anything that cannot be
//! decoded is logged and treated as absent.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::{content_items_from_value, AssetMap, ContentItem, ImageAsset, LayoutReport};

use super::pipeline::ExtractInput;

/// Keys that may carry the markdown, in order of preference.
const MARKDOWN_KEYS: [&str; 4] = ["markdown", "md_content", "content_md", "content"];

/// The parts of a backend response the extractor consumes.
#[derive(Debug, Clone, Default)]
pub struct BackendResponse {
    /// Markdown output
    pub markdown: String,
    /// Content list (`content_list`)
    pub content_items: Option<Vec<ContentItem>>,
    /// Image assets (`images`)
    pub image_assets: Option<AssetMap>,
    /// Layout report (`middle_json`)
    pub layout: Option<LayoutReport>,
}

impl BackendResponse {
    /// Decode a response from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Decode a response from a JSON value.
    ///
    /// Fails only when the value is not an object. A `results` map is
    /// unwrapped to the entry that comes first in the response text.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("backend response must be a JSON object".into()))?;

        if let Some((name, inner)) = obj
            .get("results")
            .and_then(Value::as_object)
            .and_then(|results| results.iter().next())
        {
            log::debug!("unwrapping results entry {}", name);
            return Self::from_value(inner);
        }

        if let Some(pages) = obj
            .get("result")
            .and_then(|result| result.get("layoutParsingResults"))
            .and_then(Value::as_array)
        {
            return Ok(Self::from_layout_pages(pages));
        }

        let markdown = MARKDOWN_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        let content_items = decoded(obj.get("content_list"), "content_list")
            .map(|list| content_items_from_value(&list));
        let image_assets = decoded(obj.get("images"), "images").map(|images| assets_from_value(&images));
        let layout = decoded(obj.get("middle_json"), "middle_json")
            .map(|layout| LayoutReport::from_value(&layout));

        Ok(Self {
            markdown,
            content_items,
            image_assets,
            layout,
        })
    }

    /// Pages of a layout-parsing response, joined under `# Page N` headers.
    ///
    /// Each page's `markdown.images` map is merged into one asset map; the
    /// MIME type comes from the file extension.
    fn from_layout_pages(pages: &[Value]) -> Self {
        log::debug!("decoding {} layout parsing pages", pages.len());

        let mut parts = Vec::with_capacity(pages.len());
        let mut assets = AssetMap::new();

        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .pointer("/markdown/text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            parts.push(format!("# Page {}\n\n{}", idx + 1, text.trim()));

            if let Some(images) = page.pointer("/markdown/images").and_then(Value::as_object) {
                merge_page_images(&mut assets, images, idx);
            }
        }

        Self {
            markdown: parts.join("\n\n"),
            content_items: None,
            image_assets: (!assets.is_empty()).then_some(assets),
            layout: None,
        }
    }

    /// Turn the response into pipeline input.
    pub fn into_input<'a>(self) -> ExtractInput<'a> {
        ExtractInput {
            markdown: self.markdown,
            content_items: self.content_items,
            image_assets: self.image_assets,
            layout: self.layout,
            page_source: None,
        }
    }
}

/// Parse an asset map, skipping entries that are neither strings nor descriptors.
///
/// A value that is not an object yields an empty map.
pub fn assets_from_value(value: &Value) -> AssetMap {
    let Some(entries) = value.as_object() else {
        log::warn!("image assets are not an object, ignoring them");
        return AssetMap::new();
    };

    let mut assets = AssetMap::with_capacity(entries.len());
    for (key, entry) in entries {
        match serde_json::from_value::<ImageAsset>(entry.clone()) {
            Ok(asset) => {
                assets.insert(key.clone(), asset);
            }
            Err(e) => log::warn!("skipping image asset {}: {}", key, e),
        }
    }
    assets
}

fn merge_page_images(assets: &mut AssetMap, images: &Map<String, Value>, page: usize) {
    for (name, data) in images {
        let Some(data) = data.as_str().map(str::trim).filter(|d| !d.is_empty()) else {
            log::warn!("skipping image {} on page {}: no base64 data", name, page + 1);
            continue;
        };
        if assets.contains_key(name) {
            log::warn!("image {} on page {} repeats an earlier page", name, page + 1);
            continue;
        }

        let uri = if data.starts_with("data:") {
            data.to_string()
        } else {
            format!("data:{};base64,{}", mime_for_path(name), data)
        };
        assets.insert(name.clone(), ImageAsset::Encoded(uri));
    }
}

/// MIME type from an image file name; JPEG unless it names a PNG.
fn mime_for_path(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// A field that is either inline JSON or a JSON-encoded string.
fn decoded(value: Option<&Value>, field: &str) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => match serde_json::from_str(text.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("failed to decode {}: {}", field, e);
                None
            }
        },
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_fields() {
        let value = json!({
            "markdown": "# Doc",
            "content_list": [{"type": "text", "text": "hi"}, 5],
            "images": {"a.png": "AAAA", "b.png": {"description": "chart"}, "c.png": 3},
            "middle_json": {"pdf_info": [{"page_size": [612, 792]}]}
        });
        let response = BackendResponse::from_value(&value).unwrap();

        assert_eq!(response.markdown, "# Doc");
        assert_eq!(response.content_items.as_ref().unwrap().len(), 1);

        let assets = response.image_assets.unwrap();
        assert_eq!(assets.len(), 2);
        assert!(matches!(assets["b.png"], ImageAsset::Described(_)));

        let layout = response.layout.unwrap();
        assert_eq!(layout.page(0).unwrap().size(), Some((612.0, 792.0)));
    }

    #[test]
    fn test_string_encoded_fields() {
        let value = json!({
            "md_content": "text",
            "content_list": "[{\"type\": \"table\", \"text\": \"| a |\"}]",
            "middle_json": "not json",
            "images": ""
        });
        let response = BackendResponse::from_value(&value).unwrap();

        assert_eq!(response.markdown, "text");
        assert_eq!(response.content_items.unwrap()[0].item_type, "table");
        assert!(response.layout.is_none());
        assert!(response.image_assets.is_none());
    }

    #[test]
    fn test_results_wrapper() {
        let value = json!({
            "backend": "pipeline",
            "results": {"paper": {"md_content": "wrapped"}}
        });
        let response = BackendResponse::from_value(&value).unwrap();
        assert_eq!(response.markdown, "wrapped");
    }

    #[test]
    fn test_content_md_key() {
        let response = BackendResponse::from_value(&json!({
            "backend": "deepseek",
            "pages": [{}],
            "content_md": "# Title\n\nbody"
        }))
        .unwrap();
        assert_eq!(response.markdown, "# Title\n\nbody");
    }

    #[test]
    fn test_layout_pages() {
        let value = json!({"result": {"layoutParsingResults": [
            {"markdown": {"text": "page one", "images": {"imgs/a.jpg": "QUJD"}}},
            {"markdown": {"text": "page two\n", "images": {"imgs/b.PNG": "REVG", "imgs/c.png": 7}}},
            {"prunedResult": {}}
        ]}});
        let response = BackendResponse::from_value(&value).unwrap();

        assert_eq!(
            response.markdown,
            "# Page 1\n\npage one\n\n# Page 2\n\npage two\n\n# Page 3\n\n"
        );
        assert!(response.content_items.is_none());

        let assets = response.image_assets.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(
            assets["imgs/a.jpg"].data_uri().as_deref(),
            Some("data:image/jpeg;base64,QUJD")
        );
        assert_eq!(
            assets["imgs/b.PNG"].data_uri().as_deref(),
            Some("data:image/png;base64,REVG")
        );
    }

    #[test]
    fn test_layout_pages_without_images() {
        let value = json!({"result": {"layoutParsingResults": [{"markdown": {"text": "x"}}]}});
        let response = BackendResponse::from_value(&value).unwrap();
        assert_eq!(response.markdown, "# Page 1\n\nx");
        assert!(response.image_assets.is_none());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("a.png"), "image/png");
        assert_eq!(mime_for_path("a.jpeg"), "image/jpeg");
        assert_eq!(mime_for_path("noext"), "image/jpeg");
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            BackendResponse::from_json("[1, 2]"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(BackendResponse::from_json("{oops"), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_fields() {
        let response = BackendResponse::from_json("{}").unwrap();
        assert!(response.markdown.is_empty());
        assert!(response.content_items.is_none());
        assert!(response.into_input().page_source.is_none());
    }
}
