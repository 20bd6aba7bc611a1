//! Extraction options and configuration.

use super::cleanup::CleanupOptions;

/// Lowest page render scale used for crops.
pub const MIN_RENDER_SCALE: f32 = 2.0;

/// Options for extracting OCR output.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Confidence profile for detected formulas
    pub formula_confidence: FormulaConfidence,

    /// Which tokenizer drives keyword extraction
    pub keyword_mode: KeywordMode,

    /// Maximum number of keywords
    pub max_keywords: usize,

    /// How fallback mode segments text into blocks
    pub segmentation: TextSegmentation,

    /// Markdown cleanup applied before detection
    pub cleanup: CleanupOptions,

    /// Whether to run the detector families in parallel
    pub parallel: bool,

    /// Emit records for assets no reference points at
    pub include_unreferenced_assets: bool,

    /// Page render scale for crop synthesis (at least 2.0)
    pub render_scale: f32,

    /// Channel-mean intensity below which a pixel counts as content
    pub trim_threshold: u8,

    /// Margin kept around trimmed content, in pixels
    pub trim_margin: u32,

    /// Page size assumed when neither layout nor page source reports one
    pub default_page_size: (f64, f64),
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the formula confidence profile.
    pub fn with_formula_confidence(mut self, confidence: FormulaConfidence) -> Self {
        self.formula_confidence = confidence;
        self
    }

    /// Use the lower confidences of markdown-only backends.
    pub fn markdown_only(mut self) -> Self {
        self.formula_confidence = FormulaConfidence::markdown_only();
        self
    }

    /// Set the keyword mode.
    pub fn with_keyword_mode(mut self, mode: KeywordMode) -> Self {
        self.keyword_mode = mode;
        self
    }

    /// Set the maximum number of keywords.
    pub fn with_max_keywords(mut self, max: usize) -> Self {
        self.max_keywords = max;
        self
    }

    /// Set the text segmentation.
    pub fn with_segmentation(mut self, segmentation: TextSegmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Emit records for unreferenced assets.
    pub fn with_unreferenced_assets(mut self, include: bool) -> Self {
        self.include_unreferenced_assets = include;
        self
    }

    /// Set the page render scale; values below 2.0 are raised to 2.0.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = if scale.is_finite() {
            scale.max(MIN_RENDER_SCALE)
        } else {
            MIN_RENDER_SCALE
        };
        self
    }

    /// Set the auto-trim intensity threshold.
    pub fn with_trim_threshold(mut self, threshold: u8) -> Self {
        self.trim_threshold = threshold;
        self
    }

    /// Set the auto-trim margin.
    pub fn with_trim_margin(mut self, margin: u32) -> Self {
        self.trim_margin = margin;
        self
    }

    /// Set the fallback page size in PDF points.
    pub fn with_default_page_size(mut self, width: f64, height: f64) -> Self {
        self.default_page_size = (width, height);
        self
    }

    /// Render scale actually used, never below 2.0.
    pub fn effective_render_scale(&self) -> f32 {
        if self.render_scale.is_finite() {
            self.render_scale.max(MIN_RENDER_SCALE)
        } else {
            MIN_RENDER_SCALE
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            formula_confidence: FormulaConfidence::standard(),
            keyword_mode: KeywordMode::Auto,
            max_keywords: 10,
            segmentation: TextSegmentation::Sections,
            cleanup: CleanupOptions::default(),
            parallel: true,
            include_unreferenced_assets: false,
            render_scale: MIN_RENDER_SCALE,
            trim_threshold: 240,
            trim_margin: 2,
            default_page_size: (595.0, 841.0),
        }
    }
}

/// Confidence assigned to detected formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaConfidence {
    /// `$...$` formulas
    pub inline: f64,
    /// `$$...$$` formulas
    pub block: f64,
}

impl FormulaConfidence {
    /// Profile for backends with structured output.
    pub fn standard() -> Self {
        Self {
            inline: 90.0,
            block: 90.0,
        }
    }

    /// Profile for backends that only return markdown.
    pub fn markdown_only() -> Self {
        Self {
            inline: 80.0,
            block: 85.0,
        }
    }
}

impl Default for FormulaConfidence {
    fn default() -> Self {
        Self::standard()
    }
}

/// Keyword tokenizer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordMode {
    /// CJK when the text has CJK runs, ASCII otherwise
    #[default]
    Auto,
    /// Word runs of four or more characters
    Ascii,
    /// Runs of CJK ideographs
    Cjk,
}

/// How markdown text is split into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSegmentation {
    /// One block per heading-delimited section
    #[default]
    Sections,
    /// One block per heading, list, quote or paragraph
    Blocks,
}
