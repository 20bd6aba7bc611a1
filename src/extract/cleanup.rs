//! Markdown normalization applied before any detector runs.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Options for markdown cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Collapse runs of three or more newlines into one blank line
    pub collapse_blank_lines: bool,
}

impl CleanupOptions {
    /// Leave the text untouched apart from line endings and outer whitespace.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: false,
            collapse_blank_lines: false,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            collapse_blank_lines: true,
        }
    }
}

/// Markdown cleanup pipeline.
///
/// Only whole-text normalizations live here. Anything that would rewrite
/// runs of spaces is left out, since grid tables depend on them.
pub struct CleanupPipeline {
    options: CleanupOptions,
    blank_lines_regex: Regex,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            options,
            blank_lines_regex: Regex::new(r"\n{3,}").unwrap(),
        }
    }

    /// Process markdown through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if result.contains('\r') {
            result = result.replace("\r\n", "\n").replace('\r', "\n");
        }

        if self.options.collapse_blank_lines {
            result = self.blank_lines_regex.replace_all(&result, "\n\n").to_string();
        }

        result.trim().to_string()
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}
