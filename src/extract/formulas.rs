//! Formula detection.

use regex::Regex;

use crate::error::Result;
use crate::model::{ContentItem, FormulaKind, FormulaRecord};

use super::options::FormulaConfidence;
use super::run_strategy;

/// Content items longer than this are treated as display formulas.
const INLINE_MAX_CHARS: usize = 20;

/// Confidence of formulas taken from content items.
const ITEM_CONFIDENCE: f64 = 85.0;

/// Detects `$...$` and `$$...$$` formulas in markdown.
pub struct FormulaDetector {
    confidence: FormulaConfidence,
    block: Regex,
    inline: Regex,
}

impl FormulaDetector {
    /// Create a detector with the given confidence profile.
    pub fn new(confidence: FormulaConfidence) -> Self {
        Self {
            confidence,
            block: Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap(),
            inline: Regex::new(r"\$([^$\n]+)\$").unwrap(),
        }
    }

    /// Inline formulas followed by block formulas.
    pub fn detect(&self, markdown: &str) -> Vec<FormulaRecord> {
        let mut formulas = run_strategy("inline formulas", || self.detect_inline(markdown));
        formulas.extend(run_strategy("block formulas", || self.detect_block(markdown)));
        formulas
    }

    /// `$$...$$` formulas, possibly spanning lines.
    pub fn detect_block(&self, markdown: &str) -> Result<Vec<FormulaRecord>> {
        let mut formulas = Vec::new();
        for caps in self.block.captures_iter(markdown) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let body = body.as_str().trim();
            if body.is_empty() {
                continue;
            }
            formulas.push(
                FormulaRecord::new(
                    format!("formula_block_{}", formulas.len() + 1),
                    FormulaKind::Block,
                    body,
                    self.confidence.block,
                )
                .at_offset(whole.start()),
            );
        }
        Ok(formulas)
    }

    /// Single-line `$...$` formulas outside any block formula.
    pub fn detect_inline(&self, markdown: &str) -> Result<Vec<FormulaRecord>> {
        // Blank out block spans byte-for-byte so offsets stay valid.
        let mut masked = markdown.to_string();
        for m in self.block.find_iter(markdown) {
            masked.replace_range(m.range(), &" ".repeat(m.len()));
        }

        let mut formulas = Vec::new();
        for caps in self.inline.captures_iter(&masked) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let body = body.as_str().trim();
            if body.is_empty() {
                continue;
            }
            formulas.push(
                FormulaRecord::new(
                    format!("formula_inline_{}", formulas.len() + 1),
                    FormulaKind::Inline,
                    body,
                    self.confidence.inline,
                )
                .at_offset(whole.start()),
            );
        }
        Ok(formulas)
    }

    /// Formula from a structured content item.
    pub fn from_item(&self, item: &ContentItem, idx: usize) -> Option<FormulaRecord> {
        let text = item.text.trim();
        if text.is_empty() {
            return None;
        }

        let kind = if text.chars().count() > INLINE_MAX_CHARS || text.contains('\n') {
            FormulaKind::Block
        } else {
            FormulaKind::Inline
        };

        Some(
            FormulaRecord::new(format!("formula_{}", idx), kind, text, ITEM_CONFIDENCE)
                .with_position(item.bbox, item.page_idx),
        )
    }
}

impl Default for FormulaDetector {
    fn default() -> Self {
        Self::new(FormulaConfidence::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_formula() {
        let detector = FormulaDetector::default();
        let formulas = detector.detect("Energy: $E=mc^2$ holds.");

        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].id, "formula_inline_1");
        assert_eq!(formulas[0].kind, FormulaKind::Inline);
        assert_eq!(formulas[0].raw_formula, "E=mc^2");
        assert_eq!(formulas[0].char_offset, Some(8));
        assert_eq!(formulas[0].confidence, 90.0);
    }

    #[test]
    fn test_block_formula_not_counted_inline() {
        let detector = FormulaDetector::default();
        let md = "Sum:\n$$\n\\sum_{i=1}^n i\n$$\nand $a+b$ too";
        let formulas = detector.detect(md);

        assert_eq!(formulas.len(), 2);
        assert_eq!(formulas[0].kind, FormulaKind::Inline);
        assert_eq!(formulas[0].raw_formula, "a+b");
        assert_eq!(formulas[1].id, "formula_block_1");
        assert_eq!(formulas[1].raw_formula, "\\sum_{i=1}^n i");
        assert_eq!(formulas[1].char_offset, Some(5));
    }

    #[test]
    fn test_inline_after_block_on_same_line() {
        let detector = FormulaDetector::default();
        let formulas = detector.detect_inline("$$x$$ then $y$").unwrap();
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].raw_formula, "y");
        assert_eq!(formulas[0].char_offset, Some(11));
    }

    #[test]
    fn test_inline_does_not_span_lines() {
        let detector = FormulaDetector::default();
        assert!(detector.detect_inline("costs $5\nor $").unwrap().is_empty());
    }

    #[test]
    fn test_markdown_only_confidence() {
        let detector = FormulaDetector::new(FormulaConfidence::markdown_only());
        let formulas = detector.detect("$a$ and $$b$$");
        assert_eq!(formulas[0].confidence, 80.0);
        assert_eq!(formulas[1].confidence, 85.0);
    }

    #[test]
    fn test_from_item() {
        let detector = FormulaDetector::default();

        let short = ContentItem::new("equation", "x^2").with_page(1);
        let formula = detector.from_item(&short, 3).unwrap();
        assert_eq!(formula.id, "formula_3");
        assert_eq!(formula.kind, FormulaKind::Inline);
        assert_eq!(formula.confidence, 85.0);
        assert_eq!(formula.page, Some(1));
        assert!(formula.char_offset.is_none());

        let long = ContentItem::new("interline_equation", "\\int_0^1 f(x)\\,dx = F(1) - F(0)");
        assert_eq!(detector.from_item(&long, 0).unwrap().kind, FormulaKind::Block);

        let multi = ContentItem::new("equation", "a\nb");
        assert_eq!(detector.from_item(&multi, 0).unwrap().kind, FormulaKind::Block);

        assert!(detector.from_item(&ContentItem::new("equation", "  "), 0).is_none());
    }
}
