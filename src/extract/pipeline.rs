//! The extraction pipeline: mode selection, detector dispatch and assembly.

use std::time::Instant;

use crate::error::Result;
use crate::model::{
    AssetMap, ContentItem, ContentKind, DocumentMetadata, ExtractionMode, FormulaRecord,
    HandwrittenResult, ImageRecord, LayoutReport, PerformanceHint, TableRecord, TextBlock,
    TextResult, TextStats, UnifiedDocument,
};
use crate::raster::{AssetSynthesizer, PageSource};

use super::cleanup::CleanupPipeline;
use super::formulas::FormulaDetector;
use super::images::{AssetResolver, ImageDetector};
use super::options::ExtractOptions;
use super::run_strategy;
use super::summary::TextSummarizer;
use super::tables::TableDetector;

/// Text confidence reported for structured (content item) extraction.
const STRUCTURED_CONFIDENCE: f64 = 95.0;

/// Text confidence reported for markdown pattern extraction.
const FALLBACK_CONFIDENCE: f64 = 90.0;

/// Everything one extraction call consumes.
pub struct ExtractInput<'a> {
    /// Backend markdown
    pub markdown: String,
    /// Positioned content items, in reading order
    pub content_items: Option<Vec<ContentItem>>,
    /// Image assets keyed by reference path
    pub image_assets: Option<AssetMap>,
    /// Structural layout report
    pub layout: Option<LayoutReport>,
    /// Page renderer used to synthesize missing image assets
    pub page_source: Option<&'a dyn PageSource>,
}

impl<'a> ExtractInput<'a> {
    /// Create an input from markdown alone.
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            content_items: None,
            image_assets: None,
            layout: None,
            page_source: None,
        }
    }

    /// Set the content items.
    pub fn with_content_items(mut self, items: Vec<ContentItem>) -> Self {
        self.content_items = Some(items);
        self
    }

    /// Set the image assets.
    pub fn with_assets(mut self, assets: AssetMap) -> Self {
        self.image_assets = Some(assets);
        self
    }

    /// Set the layout report.
    pub fn with_layout(mut self, layout: LayoutReport) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set the page source.
    pub fn with_page_source(mut self, source: &'a dyn PageSource) -> Self {
        self.page_source = Some(source);
        self
    }

    fn items(&self) -> &[ContentItem] {
        self.content_items.as_deref().unwrap_or_default()
    }
}

/// Records gathered by one extraction mode.
#[derive(Debug, Default)]
struct Extracted {
    tables: Vec<TableRecord>,
    formulas: Vec<FormulaRecord>,
    images: Vec<ImageRecord>,
    blocks: Vec<TextBlock>,
}

impl Extracted {
    fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.formulas.is_empty()
            && self.images.is_empty()
            && self.blocks.is_empty()
    }

    fn len(&self) -> usize {
        self.tables.len() + self.formulas.len() + self.images.len() + self.blocks.len()
    }
}

/// Turns OCR backend output into a [`UnifiedDocument`].
///
/// Holds only compiled patterns and options; every call is independent.
pub struct Extractor {
    options: ExtractOptions,
    cleanup: CleanupPipeline,
    tables: TableDetector,
    formulas: FormulaDetector,
    images: ImageDetector,
    summary: TextSummarizer,
}

impl Extractor {
    /// Create an extractor with the given options.
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            cleanup: CleanupPipeline::new(options.cleanup),
            tables: TableDetector::new(),
            formulas: FormulaDetector::new(options.formula_confidence),
            images: ImageDetector::new(),
            summary: TextSummarizer::new(&options),
            options,
        }
    }

    /// The options this extractor was built with.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from markdown alone.
    pub fn extract_markdown(&self, markdown: &str) -> Result<UnifiedDocument> {
        self.extract(&ExtractInput::new(markdown))
    }

    /// Run the full pipeline.
    pub fn extract(&self, input: &ExtractInput<'_>) -> Result<UnifiedDocument> {
        let start = Instant::now();
        let markdown = self.cleanup.process(&input.markdown);
        let items = input.items();

        let synthesized = self.synthesize_assets(input);
        let assets = input.image_assets.as_ref().or(synthesized.as_ref());

        let structured = if items.is_empty() {
            None
        } else {
            let extracted = self.structured(&markdown, items, assets);
            if Self::should_fall_back(&extracted) {
                log::info!(
                    "{} content items yielded nothing, falling back to markdown",
                    items.len()
                );
                None
            } else {
                Some(extracted)
            }
        };

        let (mode, extracted) = match structured {
            Some(extracted) => (ExtractionMode::Structured, extracted),
            None => (ExtractionMode::Fallback, self.fallback(&markdown, assets)),
        };

        let keywords = run_strategy("keywords", || Ok(self.summary.keywords(&markdown)));

        let (confidence, total_elements, pages) = match mode {
            ExtractionMode::Structured => (
                STRUCTURED_CONFIDENCE,
                items.len(),
                items.iter().map(|i| i.page_idx as usize + 1).max().unwrap_or(0),
            ),
            ExtractionMode::Fallback => (
                FALLBACK_CONFIDENCE,
                extracted.len(),
                Self::fallback_page_count(&markdown, input.layout.as_ref()),
            ),
        };

        let mut doc = UnifiedDocument {
            text: TextResult {
                stats: TextStats::from_text(&markdown, pages),
                full_text: markdown,
                blocks: extracted.blocks,
                keywords,
                confidence,
            },
            tables: extracted.tables,
            formulas: extracted.formulas,
            images: extracted.images,
            handwritten_flag: HandwrittenResult::default(),
            performance_hint: PerformanceHint::default(),
            metadata: DocumentMetadata {
                total_elements,
                mode,
                ..Default::default()
            },
        };

        let elapsed = start.elapsed().as_secs_f64();
        doc.metadata.content_type_tags = doc.content_types();
        doc.metadata.processing_time = Some(elapsed);
        doc.performance_hint = PerformanceHint {
            accuracy: confidence,
            speed: elapsed,
            memory: 0,
        };

        log::info!(
            "{} extraction: {} blocks, {} tables, {} formulas, {} images in {:.3}s",
            mode,
            doc.text.blocks.len(),
            doc.tables.len(),
            doc.formulas.len(),
            doc.images.len(),
            elapsed
        );

        Ok(doc)
    }

    /// Whether structured extraction produced nothing usable.
    fn should_fall_back(extracted: &Extracted) -> bool {
        extracted.is_empty()
    }

    fn synthesize_assets(&self, input: &ExtractInput<'_>) -> Option<AssetMap> {
        if input.image_assets.is_some() {
            return None;
        }
        let source = input.page_source?;
        let items = input.items();
        if !AssetSynthesizer::has_candidates(items) {
            return None;
        }

        let synthesizer = AssetSynthesizer::new(&self.options);
        Some(synthesizer.synthesize(items, input.layout.as_ref(), source))
    }

    fn structured(
        &self,
        markdown: &str,
        items: &[ContentItem],
        assets: Option<&AssetMap>,
    ) -> Extracted {
        let mut extracted = Extracted::default();

        if markdown.to_ascii_lowercase().contains("<table") {
            extracted.tables = run_strategy("html tables", || self.tables.detect_html(markdown));
        }

        for (idx, item) in items.iter().enumerate() {
            let kind = item.kind();
            log::debug!("item {}: {:?} ({} chars)", idx, kind, item.text.len());
            match kind {
                ContentKind::Table => extracted.tables.extend(self.tables.from_item(item, idx)),
                ContentKind::Image => extracted.images.push(self.images.from_item(item, idx)),
                ContentKind::Formula => {
                    extracted.formulas.extend(self.formulas.from_item(item, idx))
                }
                ContentKind::Text => extracted.blocks.extend(self.summary.from_item(item, idx)),
                ContentKind::Unknown => {}
            }
        }

        self.materialize(&mut extracted.images, assets);
        extracted
    }

    fn fallback(&self, markdown: &str, assets: Option<&AssetMap>) -> Extracted {
        let (tables, (formulas, mut images)) = if self.options.parallel {
            rayon::join(
                || self.tables.detect(markdown),
                || {
                    rayon::join(
                        || self.formulas.detect(markdown),
                        || self.images.detect(markdown),
                    )
                },
            )
        } else {
            (
                self.tables.detect(markdown),
                (self.formulas.detect(markdown), self.images.detect(markdown)),
            )
        };

        self.materialize(&mut images, assets);
        let blocks = run_strategy("text blocks", || Ok(self.summary.blocks(markdown)));

        Extracted {
            tables,
            formulas,
            images,
            blocks,
        }
    }

    fn materialize(&self, images: &mut Vec<ImageRecord>, assets: Option<&AssetMap>) {
        if let Some(assets) = assets {
            AssetResolver::new(assets)
                .materialize(images, self.options.include_unreferenced_assets);
        }
    }

    fn fallback_page_count(markdown: &str, layout: Option<&LayoutReport>) -> usize {
        match layout.map(LayoutReport::page_count) {
            Some(count) if count > 0 => count,
            _ if !markdown.is_empty() => 1,
            _ => 0,
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, ImageAsset, TableSource};

    #[test]
    fn test_fallback_mode() {
        let extractor = Extractor::default();
        let md = "# Title\n\nSome text with $x^2$.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n![fig](f.png)";
        let doc = extractor.extract_markdown(md).unwrap();

        assert_eq!(doc.metadata.mode, ExtractionMode::Fallback);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.formulas.len(), 1);
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.text.confidence, 90.0);
        assert_eq!(doc.performance_hint.accuracy, 90.0);
        assert_eq!(doc.text.stats.pages, 1);
        assert_eq!(
            doc.metadata.content_type_tags,
            vec![
                ContentType::Text,
                ContentType::Tables,
                ContentType::Formulas,
                ContentType::Images
            ]
        );
        assert_eq!(doc.metadata.total_elements, doc.element_count());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let md = "| a |\n|---|\n| 1 |\n\n$y$ and ![i](p.png)\n\n<table><tr><td>h</td></tr><tr><td>v</td></tr></table>";
        let parallel = Extractor::default().extract_markdown(md).unwrap();
        let sequential = Extractor::new(ExtractOptions::new().sequential())
            .extract_markdown(md)
            .unwrap();

        assert_eq!(parallel.tables, sequential.tables);
        assert_eq!(parallel.formulas, sequential.formulas);
        assert_eq!(parallel.images, sequential.images);
        assert_eq!(parallel.text.blocks, sequential.text.blocks);
    }

    #[test]
    fn test_structured_mode() {
        let extractor = Extractor::default();
        let items = vec![
            ContentItem::new("title", "Report").with_bbox([0.0, 0.0, 100.0, 20.0]),
            ContentItem::new("table", "| a | b |\n| 1 | 2 |").with_page(1),
            ContentItem::new("image", "chart").with_img_path("images/c.jpg"),
            ContentItem::new("equation", "E=mc^2"),
            ContentItem::new("page_footer", "ignored"),
        ];
        let mut assets = AssetMap::new();
        assets.insert("images/c.jpg".into(), ImageAsset::Encoded("/9j/AAAA".into()));

        let input = ExtractInput::new("# Report\n\n<table><tr><td>h</td></tr><tr><td>v</td></tr></table>")
            .with_content_items(items)
            .with_assets(assets);
        let doc = extractor.extract(&input).unwrap();

        assert_eq!(doc.metadata.mode, ExtractionMode::Structured);
        assert_eq!(doc.metadata.total_elements, 5);
        assert_eq!(doc.text.confidence, 95.0);
        assert_eq!(doc.text.stats.pages, 2);

        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].source_strategy, TableSource::Html);
        assert_eq!(doc.tables[1].id, "table_1");
        assert_eq!(doc.tables[1].page, Some(1));

        assert_eq!(doc.images.len(), 1);
        assert_eq!(
            doc.images[0].pixel_data.as_deref(),
            Some("data:image/png;base64,/9j/AAAA")
        );
        assert_eq!(doc.formulas.len(), 1);
        assert_eq!(doc.text.blocks.len(), 1);
        assert_eq!(doc.text.blocks[0].title.as_deref(), Some("Report"));
    }

    #[test]
    fn test_empty_structured_yield_falls_back() {
        let extractor = Extractor::default();
        let input = ExtractInput::new("| a |\n|---|\n| 1 |")
            .with_content_items(vec![ContentItem::new("page_number", "1")]);
        let doc = extractor.extract(&input).unwrap();

        assert_eq!(doc.metadata.mode, ExtractionMode::Fallback);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].id, "table_pipe_1");
    }

    #[test]
    fn test_empty_markdown() {
        let doc = Extractor::default().extract_markdown("  \n\n ").unwrap();
        assert!(doc.text.full_text.is_empty());
        assert!(doc.text.blocks.is_empty());
        assert_eq!(doc.text.stats.pages, 0);
        assert_eq!(doc.metadata.content_type_tags, vec![ContentType::Text]);
        assert_eq!(doc.metadata.total_elements, 0);
        assert!(!doc.handwritten_flag.detected);
    }

    #[test]
    fn test_layout_page_count_in_fallback() {
        let layout: LayoutReport =
            serde_json::from_str(r#"{"pdf_info": [{}, {}, {}]}"#).unwrap();
        let input = ExtractInput::new("text").with_layout(layout);
        let doc = Extractor::default().extract(&input).unwrap();
        assert_eq!(doc.text.stats.pages, 3);
    }

    #[test]
    fn test_should_fall_back() {
        assert!(Extractor::should_fall_back(&Extracted::default()));
        let extracted = Extracted {
            blocks: vec![TextBlock::new(crate::model::TextBlockKind::Text, "x")],
            ..Default::default()
        };
        assert!(!Extractor::should_fall_back(&extracted));
    }
}
