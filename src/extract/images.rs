//! Image reference detection and asset materialization.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use crate::error::Result;
use crate::model::{AssetMap, BBox, ContentItem, ImageAsset, ImageRecord};

use super::run_strategy;

/// Confidence of images taken from content items.
const ITEM_CONFIDENCE: f64 = 88.0;

/// Confidence of records built from unreferenced assets.
const ASSET_CONFIDENCE: f64 = 95.0;

/// Detects image references in markdown.
pub struct ImageDetector {
    markdown: Regex,
    html: Regex,
    html_alt: Regex,
    chinese_ref: Regex,
    english_ref: Regex,
    deepseek: Regex,
}

impl ImageDetector {
    /// Create a new image detector.
    pub fn new() -> Self {
        Self {
            markdown: Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap(),
            html: Regex::new(r#"(?i)<img[^>]*src=["']([^"']+)["'][^>]*>"#).unwrap(),
            html_alt: Regex::new(r#"(?i)\balt=["']([^"']*)["']"#).unwrap(),
            chinese_ref: Regex::new(r"\[图片[:：]\s*([^\]]+)\]").unwrap(),
            english_ref: Regex::new(r"(?i)\[(?:Image|Figure|Fig):\s*([^\]]+)\]").unwrap(),
            deepseek: Regex::new(r"<\|ref\|>image<\|/ref\|><\|det\|>\[\[([^\]]+)\]\]<\|/det\|>")
                .unwrap(),
        }
    }

    /// Run all five strategies in order.
    pub fn detect(&self, markdown: &str) -> Vec<ImageRecord> {
        let mut images = run_strategy("markdown images", || self.detect_markdown(markdown));
        images.extend(run_strategy("html images", || self.detect_html(markdown)));
        images.extend(run_strategy("chinese image refs", || {
            self.detect_chinese_refs(markdown)
        }));
        images.extend(run_strategy("english image refs", || {
            self.detect_english_refs(markdown)
        }));
        images.extend(run_strategy("deepseek markers", || {
            self.detect_deepseek_markers(markdown)
        }));
        images
    }

    /// `![alt](path)`
    pub fn detect_markdown(&self, markdown: &str) -> Result<Vec<ImageRecord>> {
        let mut images = Vec::new();
        for caps in self.markdown.captures_iter(markdown) {
            let (Some(whole), Some(alt), Some(path)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let alt = alt.as_str().trim();
            images.push(
                ImageRecord::new(
                    format!("md_image_{}", images.len() + 1),
                    "markdown",
                    path.as_str().trim(),
                    95.0,
                )
                .with_text(alt, alt)
                .at_offset(whole.start()),
            );
        }
        Ok(images)
    }

    /// `<img src="...">`, with `alt` read from anywhere in the tag.
    pub fn detect_html(&self, markdown: &str) -> Result<Vec<ImageRecord>> {
        let mut images = Vec::new();
        for caps in self.html.captures_iter(markdown) {
            let (Some(whole), Some(src)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let alt = self
                .html_alt
                .captures(whole.as_str())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .filter(|alt| !alt.is_empty())
                .unwrap_or("Image");
            images.push(
                ImageRecord::new(
                    format!("html_image_{}", images.len() + 1),
                    "html",
                    src.as_str().trim(),
                    90.0,
                )
                .with_text(alt, alt)
                .at_offset(whole.start()),
            );
        }
        Ok(images)
    }

    /// `[图片: description]`, with an ASCII or full-width colon.
    pub fn detect_chinese_refs(&self, markdown: &str) -> Result<Vec<ImageRecord>> {
        Ok(self.detect_refs(&self.chinese_ref, markdown, "cn_image", "图片"))
    }

    /// `[Image: ...]`, `[Figure: ...]` or `[Fig: ...]`.
    pub fn detect_english_refs(&self, markdown: &str) -> Result<Vec<ImageRecord>> {
        Ok(self.detect_refs(&self.english_ref, markdown, "en_image", "Image"))
    }

    /// DeepSeek `<|ref|>image<|/ref|><|det|>[[bbox]]<|/det|>` markers.
    pub fn detect_deepseek_markers(&self, markdown: &str) -> Result<Vec<ImageRecord>> {
        let mut images = Vec::new();
        for caps in self.deepseek.captures_iter(markdown) {
            let (Some(whole), Some(raw)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let raw = raw.as_str().trim();
            let n = images.len() + 1;
            images.push(
                ImageRecord::new(
                    format!("deepseek_image_{}", n),
                    "deepseek_marker",
                    format!("deepseek_image_{}", n),
                    95.0,
                )
                .with_text("DeepSeek Image", format!("Image with bbox: {}", raw))
                .with_position(parse_marker_bbox(raw), None)
                .at_offset(whole.start()),
            );
        }
        Ok(images)
    }

    /// Image from a structured content item.
    pub fn from_item(&self, item: &ContentItem, idx: usize) -> ImageRecord {
        let text = item.text.trim();
        let description = if text.is_empty() {
            format!("Image {}", idx + 1)
        } else {
            text.to_string()
        };

        ImageRecord::new(
            format!("image_{}", idx),
            "content_item",
            item.img_path.clone().unwrap_or_default(),
            ITEM_CONFIDENCE,
        )
        .with_text(text, description)
        .with_position(item.bbox, Some(item.page_idx))
    }

    fn detect_refs(
        &self,
        pattern: &Regex,
        markdown: &str,
        id_prefix: &str,
        alt: &str,
    ) -> Vec<ImageRecord> {
        let mut images = Vec::new();
        for caps in pattern.captures_iter(markdown) {
            let (Some(whole), Some(desc)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let n = images.len() + 1;
            images.push(
                ImageRecord::new(
                    format!("{}_{}", id_prefix, n),
                    "reference",
                    format!("image_{}", n),
                    85.0,
                )
                .with_text(alt, desc.as_str().trim())
                .at_offset(whole.start()),
            );
        }
        images
    }
}

impl Default for ImageDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `x1, y1, x2, y2`; anything but four numbers is no bbox.
fn parse_marker_bbox(raw: &str) -> Option<BBox> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [x1, y1, x2, y2] if values.iter().all(|v| v.is_finite()) => Some([*x1, *y1, *x2, *y2]),
        _ => None,
    }
}

/// Outcome of looking up one image record in the asset map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetResolution {
    /// Pixel data was attached
    Resolved,
    /// A descriptor matched but carried no pixel data
    DescribedOnly,
    /// No asset under the record's path; the record stays path-only
    Unresolved,
    /// The record already had pixels or has no path
    Skipped,
}

/// Attaches pixel data from an asset map to image records.
pub struct AssetResolver<'a> {
    assets: &'a AssetMap,
}

impl<'a> AssetResolver<'a> {
    /// Create a resolver over an asset map.
    pub fn new(assets: &'a AssetMap) -> Self {
        Self { assets }
    }

    /// Look up one record by exact path.
    pub fn resolve(&self, record: &mut ImageRecord) -> AssetResolution {
        if record.has_pixels() || record.path.is_empty() {
            return AssetResolution::Skipped;
        }

        let Some(asset) = self.assets.get(&record.path) else {
            log::debug!("no asset for image {} ({})", record.id, record.path);
            return AssetResolution::Unresolved;
        };

        if let ImageAsset::Described(desc) = asset {
            if let Some(kind) = &desc.kind {
                record.kind = kind.clone();
            }
            if let Some(description) = &desc.description {
                record.description = description.clone();
            }
            if let Some(alt) = &desc.alt_text {
                record.alt_text = alt.clone();
            }
            if let Some(confidence) = desc.confidence {
                record.confidence = confidence.clamp(0.0, 100.0);
            }
            if let Some(path) = &desc.path {
                record.path = path.clone();
            }
        }

        match asset.data_uri() {
            Some(uri) => {
                record.pixel_data = Some(uri);
                AssetResolution::Resolved
            }
            None => AssetResolution::DescribedOnly,
        }
    }

    /// Resolve every record; optionally append records for unused assets.
    pub fn materialize(&self, records: &mut Vec<ImageRecord>, include_unreferenced: bool) {
        let referenced: HashSet<String> = records.iter().map(|r| r.path.clone()).collect();

        let mut resolved = 0;
        let mut unresolved = 0;
        for record in records.iter_mut() {
            match self.resolve(record) {
                AssetResolution::Resolved => resolved += 1,
                AssetResolution::Unresolved => unresolved += 1,
                AssetResolution::DescribedOnly | AssetResolution::Skipped => {}
            }
        }
        if unresolved > 0 {
            log::warn!(
                "{} image references have no asset (available: {})",
                unresolved,
                self.assets.len()
            );
        }
        log::debug!("resolved pixel data for {} images", resolved);

        if include_unreferenced {
            records.extend(self.unreferenced(&referenced));
        }
    }

    /// Records for assets whose key no reference used, in key order.
    pub fn unreferenced(&self, referenced: &HashSet<String>) -> Vec<ImageRecord> {
        let mut keys: Vec<&String> = self
            .assets
            .keys()
            .filter(|key| !referenced.contains(*key))
            .collect();
        keys.sort();

        keys.into_iter()
            .map(|key| {
                let id = Path::new(key.as_str())
                    .with_extension("")
                    .to_string_lossy()
                    .into_owned();
                let mut record = ImageRecord::new(id, "asset", key.as_str(), ASSET_CONFIDENCE)
                    .with_text(format!("Image {}", key), format!("Image asset {}", key));
                self.resolve(&mut record);
                record
            })
            .collect()
    }
}
