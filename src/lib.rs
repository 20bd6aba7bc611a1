//! # unocr
//!
//! Structured content extraction from OCR backend output.
//!
//! OCR services hand back free-form markdown, markdown with embedded HTML
//! tables, position-annotated content lists and image assets in a handful of
//! shapes. This library normalizes all of it into one [`UnifiedDocument`]:
//! text blocks, tables, formulas and images with bounding boxes and
//! confidence scores.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unocr::{extract_markdown, render};
//!
//! fn main() -> unocr::Result<()> {
//!     let doc = extract_markdown("# Results\n\n| a | b |\n|---|---|\n| 1 | 2 |")?;
//!     println!("{} tables", doc.tables.len());
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two extraction modes**: content-list driven, or pattern matching over markdown
//! - **Table heuristics**: pipe, HTML, box-drawing and whitespace-aligned tables
//! - **Image references**: markdown, HTML, bracketed captions and DeepSeek markers
//! - **Asset synthesis**: crops image regions out of rendered pages when a
//!   backend reports only coordinates
//! - **CJK support**: keyword extraction over Chinese text
//! - **Parallel processing**: strategy families run on Rayon

pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod raster;
pub mod render;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, BinaryFormat};
pub use error::{Error, Result};
pub use extract::{
    BackendResponse, CleanupOptions, ExtractInput, ExtractOptions, Extractor, FormulaConfidence,
    KeywordMode, TextSegmentation,
};
pub use model::{
    AssetMap, BBox, ContentItem, ContentKind, ExtractionMode, FormulaRecord, ImageAsset,
    ImageRecord, LayoutReport, TableRecord, TextBlock, UnifiedDocument,
};
pub use raster::{AssetSynthesizer, CoordinateTransform, PageSource, RasterPages};
pub use render::JsonFormat;

use std::path::Path;

/// Extract structured content with default options.
///
/// # Arguments
///
/// * `markdown` - Backend markdown
/// * `content_items` - Optional positioned content list
/// * `image_assets` - Optional image assets keyed by reference path
///
/// # Example
///
/// ```
/// use unocr::{extract, ContentItem};
///
/// let items = vec![ContentItem::new("table", "| a | b |\n| 1 | 2 |")];
/// let doc = extract("", Some(items), None).unwrap();
/// assert_eq!(doc.tables.len(), 1);
/// ```
pub fn extract(
    markdown: &str,
    content_items: Option<Vec<ContentItem>>,
    image_assets: Option<AssetMap>,
) -> Result<UnifiedDocument> {
    let input = ExtractInput {
        markdown: markdown.to_string(),
        content_items,
        image_assets,
        layout: None,
        page_source: None,
    };
    Extractor::default().extract(&input)
}

/// Extract structured content from markdown alone.
///
/// # Example
///
/// ```
/// use unocr::extract_markdown;
///
/// let doc = extract_markdown("Energy: $E=mc^2$").unwrap();
/// assert_eq!(doc.formulas[0].raw_formula, "E=mc^2");
/// ```
pub fn extract_markdown(markdown: &str) -> Result<UnifiedDocument> {
    Extractor::default().extract_markdown(markdown)
}

/// Extract structured content from a whole backend response.
///
/// Recognized keys: `markdown` (or `md_content`), `content_list`, `images`
/// and `middle_json`. Structured fields may be inline JSON or JSON-encoded
/// strings.
pub fn extract_json(json: &str) -> Result<UnifiedDocument> {
    Unocr::new().extract_json(json)
}

/// Extract structured content from a file.
///
/// `.json` files are read as backend responses, anything else as markdown.
///
/// # Example
///
/// ```no_run
/// use unocr::extract_file;
///
/// let doc = extract_file("output/paper.md").unwrap();
/// println!("{} images", doc.images.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<UnifiedDocument> {
    Unocr::new().extract_file(path)
}

/// Builder for configuring and running extractions.
///
/// # Example
///
/// ```no_run
/// use unocr::{KeywordMode, Unocr};
///
/// let doc = Unocr::new()
///     .markdown_only_confidence()
///     .with_keyword_mode(KeywordMode::Cjk)
///     .sequential()
///     .extract_file("output/paper.md")?;
/// # Ok::<(), unocr::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Unocr {
    options: ExtractOptions,
}

impl Unocr {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Use the lower formula confidences of markdown-only backends.
    pub fn markdown_only_confidence(mut self) -> Self {
        self.options = self.options.markdown_only();
        self
    }

    /// Set keyword extraction mode.
    pub fn with_keyword_mode(mut self, mode: KeywordMode) -> Self {
        self.options = self.options.with_keyword_mode(mode);
        self
    }

    /// Set text segmentation for markdown-only input.
    pub fn with_segmentation(mut self, segmentation: TextSegmentation) -> Self {
        self.options = self.options.with_segmentation(segmentation);
        self
    }

    /// Append image assets nothing references.
    pub fn with_unreferenced_assets(mut self, include: bool) -> Self {
        self.options = self.options.with_unreferenced_assets(include);
        self
    }

    /// Set the page render scale for asset synthesis.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.options = self.options.with_render_scale(scale);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// The configured options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Build an extractor with the configured options.
    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.options.clone())
    }

    /// Run the pipeline over prepared input.
    pub fn extract(&self, input: &ExtractInput<'_>) -> Result<UnifiedDocument> {
        self.extractor().extract(input)
    }

    /// Extract from markdown alone.
    pub fn extract_markdown(&self, markdown: &str) -> Result<UnifiedDocument> {
        self.extractor().extract_markdown(markdown)
    }

    /// Extract from a backend response.
    pub fn extract_json(&self, json: &str) -> Result<UnifiedDocument> {
        let response = BackendResponse::from_json(json)?;
        self.extract(&response.into_input())
    }

    /// Extract from a backend response, rendering missing image assets from
    /// the given pages.
    pub fn extract_json_with_pages(
        &self,
        json: &str,
        pages: &dyn PageSource,
    ) -> Result<UnifiedDocument> {
        let response = BackendResponse::from_json(json)?;
        self.extract(&response.into_input().with_page_source(pages))
    }

    /// Extract from a `.json` response or a markdown file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<UnifiedDocument> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        log::debug!("extracting {} ({} bytes)", path.display(), text.len());
        if is_json {
            self.extract_json(&text)
        } else {
            self.extract_markdown(&text)
        }
    }
}
