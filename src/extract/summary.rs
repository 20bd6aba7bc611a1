//! Text segmentation and keyword extraction.

use std::collections::HashMap;

use regex::Regex;

use crate::model::{ContentItem, TextBlock, TextBlockKind};

use super::options::{ExtractOptions, KeywordMode, TextSegmentation};

/// Title of the section preceding the first heading.
pub const BODY_SECTION_TITLE: &str = "正文";

/// Item titles are cut to this many characters.
const TITLE_MAX_CHARS: usize = 50;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "about", "also", "been", "from", "have", "into", "more", "most", "only", "other", "over",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "very", "were", "what", "when", "where", "which", "will", "with", "would", "your",
];

const CHINESE_STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也", "很",
    "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这",
];

/// Splits text into blocks and picks frequent terms.
pub struct TextSummarizer {
    keyword_mode: KeywordMode,
    max_keywords: usize,
    segmentation: TextSegmentation,
    heading: Regex,
    ascii_word: Regex,
    cjk_run: Regex,
}

impl TextSummarizer {
    /// Create a summarizer from extraction options.
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            keyword_mode: options.keyword_mode,
            max_keywords: options.max_keywords,
            segmentation: options.segmentation,
            heading: Regex::new(r"^(#{1,6})\s+(.*)$").unwrap(),
            ascii_word: Regex::new(r"\b\w{4,}\b").unwrap(),
            cjk_run: Regex::new(r"[\u{4e00}-\u{9fff}]+").unwrap(),
        }
    }

    /// Segment markdown according to the configured segmentation.
    pub fn blocks(&self, markdown: &str) -> Vec<TextBlock> {
        match self.segmentation {
            TextSegmentation::Sections => self.sections(markdown),
            TextSegmentation::Blocks => self.segment_blocks(markdown),
        }
    }

    /// One block per heading-delimited section.
    ///
    /// Text before the first heading forms the body section. Sections with
    /// no content are dropped.
    pub fn sections(&self, markdown: &str) -> Vec<TextBlock> {
        let mut blocks = Vec::new();
        let mut title = BODY_SECTION_TITLE.to_string();
        let mut level = 0;
        let mut content: Vec<&str> = Vec::new();

        for line in markdown.lines() {
            if let Some(caps) = self.heading.captures(line.trim_end()) {
                push_section(&mut blocks, &title, level, &content);
                level = caps.get(1).map_or(0, |m| m.as_str().len() as u32);
                title = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                content.clear();
            } else {
                content.push(line);
            }
        }
        push_section(&mut blocks, &title, level, &content);

        blocks
    }

    /// Line-based blocks: headings, lists, quotes and paragraphs.
    ///
    /// A blank line or a change of line kind closes the current block.
    pub fn segment_blocks(&self, markdown: &str) -> Vec<TextBlock> {
        let mut blocks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_kind = TextBlockKind::Paragraph;

        for line in markdown.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                flush_block(&mut blocks, current_kind, &mut current);
                continue;
            }

            if let Some(caps) = self.heading.captures(stripped) {
                flush_block(&mut blocks, current_kind, &mut current);
                let level = caps.get(1).map_or(0, |m| m.as_str().len() as u32);
                let text = caps.get(2).map_or("", |m| m.as_str()).trim();
                blocks.push(
                    TextBlock::new(TextBlockKind::Heading, text)
                        .with_title(text)
                        .with_level(level),
                );
                continue;
            }

            let (kind, text) = if ["- ", "* ", "+ "].iter().any(|m| stripped.starts_with(m)) {
                (TextBlockKind::List, stripped)
            } else if let Some(quoted) = stripped.strip_prefix("> ") {
                (TextBlockKind::Quote, quoted)
            } else {
                (TextBlockKind::Paragraph, stripped)
            };

            if kind != current_kind {
                flush_block(&mut blocks, current_kind, &mut current);
                current_kind = kind;
            }
            current.push(text);
        }
        flush_block(&mut blocks, current_kind, &mut current);

        blocks
    }

    /// Text block from a structured content item.
    pub fn from_item(&self, item: &ContentItem, _idx: usize) -> Option<TextBlock> {
        let text = item.text.trim();
        if text.is_empty() {
            return None;
        }

        let tag = item.item_type.to_lowercase();
        let kind = if tag.contains("title") {
            TextBlockKind::Heading
        } else if tag.contains("paragraph") {
            TextBlockKind::Paragraph
        } else {
            TextBlockKind::Text
        };

        Some(
            TextBlock::new(kind, text)
                .with_title(truncate_title(text))
                .with_position(item.bbox, item.page_idx),
        )
    }

    /// Most frequent terms, ties in order of first appearance.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let use_cjk = match self.keyword_mode {
            KeywordMode::Cjk => true,
            KeywordMode::Ascii => false,
            KeywordMode::Auto => self.has_cjk_terms(text),
        };

        let terms: Vec<String> = if use_cjk {
            self.cjk_run
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|w| w.chars().count() >= 2 && !CHINESE_STOP_WORDS.contains(w))
                .map(str::to_string)
                .collect()
        } else {
            let lowered = text.to_lowercase();
            self.ascii_word
                .find_iter(&lowered)
                .map(|m| m.as_str())
                .filter(|w| !ENGLISH_STOP_WORDS.contains(w))
                .map(str::to_string)
                .collect()
        };

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for term in terms {
            match index.get(&term) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(term.clone(), counts.len());
                    counts.push((term, 1));
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .take(self.max_keywords)
            .map(|(term, _)| term)
            .collect()
    }

    fn has_cjk_terms(&self, text: &str) -> bool {
        self.cjk_run
            .find_iter(text)
            .any(|m| m.as_str().chars().count() >= 2)
    }
}

impl Default for TextSummarizer {
    fn default() -> Self {
        Self::new(&ExtractOptions::default())
    }
}

fn push_section(blocks: &mut Vec<TextBlock>, title: &str, level: u32, content: &[&str]) {
    let body = content.join("\n");
    let body = body.trim();
    if body.is_empty() {
        return;
    }
    blocks.push(
        TextBlock::new(TextBlockKind::Section, body)
            .with_title(title)
            .with_level(level),
    );
}

fn flush_block(blocks: &mut Vec<TextBlock>, kind: TextBlockKind, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    blocks.push(TextBlock::new(kind, lines.join("\n")));
    lines.clear();
}

fn truncate_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
