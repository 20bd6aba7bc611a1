//! Table detection over OCR markdown.
//!
//! Four independent strategies look for tables in the raw text: markdown pipe
//! tables, HTML `<table>` markup, box-drawing ASCII art and whitespace-aligned
//! grids. Their results are concatenated in that order without deduplication.

use regex::Regex;

use crate::error::Result;
use crate::model::{ContentItem, TableRecord, TableSource};

use super::run_strategy;

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum consecutive box-drawing lines for an ASCII table
    pub min_ascii_lines: usize,
    /// Minimum consecutive aligned lines for a grid table
    pub min_grid_lines: usize,
    /// Minimum header cells for a grid table
    pub min_grid_columns: usize,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_ascii_lines: 3,
            min_grid_lines: 3,
            min_grid_columns: 2,
        }
    }
}

/// Detects tables in markdown text.
pub struct TableDetector {
    config: TableDetectorConfig,
    html_table: Regex,
    html_row: Regex,
    html_cell: Regex,
    html_tag: Regex,
    box_start: Regex,
    box_line: Regex,
    ascii_split: Regex,
    grid_line: Regex,
    grid_split: Regex,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::with_config(TableDetectorConfig::default())
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self {
            config,
            html_table: Regex::new(r"(?is)<table[^>]*>(.*?)</table>").unwrap(),
            html_row: Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap(),
            html_cell: Regex::new(r"(?is)<t[hd][^>]*>(.*?)</t[hd]>").unwrap(),
            html_tag: Regex::new(r"<[^>]+>").unwrap(),
            box_start: Regex::new(r"[╔╚╠╦╣╤╧╟╢╥╨║═│├┤┬┴┼┌┐└┘]").unwrap(),
            box_line: Regex::new(r"[╔╚╠╦╣╤╧╟╢╥╨║═│├┤┬┴┼┌┐└┘─]").unwrap(),
            ascii_split: Regex::new(r"\s{2,}").unwrap(),
            grid_line: Regex::new(r"\S[ \t]{3,}\S").unwrap(),
            grid_split: Regex::new(r"[ \t]{3,}").unwrap(),
        }
    }

    /// Run all four strategies in order.
    pub fn detect(&self, markdown: &str) -> Vec<TableRecord> {
        let mut tables = run_strategy("pipe tables", || self.detect_pipe(markdown));
        tables.extend(run_strategy("html tables", || self.detect_html(markdown)));
        tables.extend(run_strategy("ascii tables", || self.detect_ascii(markdown)));
        tables.extend(run_strategy("grid tables", || self.detect_grid(markdown)));
        log::debug!("TableDetector: {} tables total", tables.len());
        tables
    }

    /// Markdown pipe tables: a `|` line followed by a `---` separator line.
    pub fn detect_pipe(&self, markdown: &str) -> Result<Vec<TableRecord>> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut tables = Vec::new();
        let mut table_id = 0;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim();
            if !(line.contains('|') && i + 1 < lines.len() && lines[i + 1].contains("---")) {
                i += 1;
                continue;
            }

            table_id += 1;
            let headers = split_pipe_row(line);
            i += 2;

            let mut rows = Vec::new();
            while i < lines.len() && lines[i].contains('|') {
                rows.push(split_pipe_row(lines[i].trim()));
                i += 1;
            }

            let source = TableSource::Pipe;
            if let Some(table) = TableRecord::build(
                format!("{}_{}", source.id_prefix(), table_id),
                format!("Table {}", table_id),
                headers,
                rows,
                source.confidence(),
                source,
            ) {
                tables.push(table);
            }
        }

        Ok(tables)
    }

    /// HTML `<table>` markup; the first row with cells is the header.
    pub fn detect_html(&self, markdown: &str) -> Result<Vec<TableRecord>> {
        let mut tables = Vec::new();

        for (idx, caps) in self.html_table.captures_iter(markdown).enumerate() {
            let raw = caps.get(0).map_or("", |m| m.as_str());
            let body = caps.get(1).map_or("", |m| m.as_str());

            let mut rows: Vec<Vec<String>> = self
                .html_row
                .captures_iter(body)
                .map(|row| {
                    let row_html = row.get(1).map_or("", |m| m.as_str());
                    self.html_cell
                        .captures_iter(row_html)
                        .map(|cell| self.cell_text(cell.get(1).map_or("", |m| m.as_str())))
                        .collect::<Vec<String>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();

            if rows.len() < 2 {
                log::debug!("html table {}: fewer than two rows, skipping", idx + 1);
                continue;
            }

            let headers = rows.remove(0);
            let source = TableSource::Html;
            if let Some(table) = TableRecord::build(
                format!("{}_{}", source.id_prefix(), idx + 1),
                format!("HTML Table {}", idx + 1),
                headers,
                rows,
                source.confidence(),
                source,
            ) {
                tables.push(table.with_html(raw));
            }
        }

        Ok(tables)
    }

    /// Runs of box-drawing lines with box characters treated as separators.
    pub fn detect_ascii(&self, markdown: &str) -> Result<Vec<TableRecord>> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut tables = Vec::new();
        let mut table_id = 0;
        let mut i = 0;

        while i < lines.len() {
            if !self.box_start.is_match(lines[i]) {
                i += 1;
                continue;
            }

            let start = i;
            while i < lines.len() && self.box_line.is_match(lines[i]) {
                i += 1;
            }
            let block = &lines[start..i];
            if block.len() < self.config.min_ascii_lines {
                continue;
            }

            table_id += 1;
            let mut rows: Vec<Vec<String>> = block
                .iter()
                .map(|line| {
                    let cleaned = self.box_line.replace_all(line, " ");
                    self.ascii_split
                        .split(&cleaned)
                        .map(str::trim)
                        .filter(|cell| !cell.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<String>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();

            if rows.len() < 2 {
                continue;
            }

            let headers = rows.remove(0);
            let source = TableSource::Ascii;
            if let Some(table) = TableRecord::build(
                format!("{}_{}", source.id_prefix(), table_id),
                format!("ASCII Table {}", table_id),
                headers,
                rows,
                source.confidence(),
                source,
            ) {
                tables.push(table);
            }
        }

        Ok(tables)
    }

    /// Runs of lines whose columns are separated by three or more spaces.
    ///
    /// A rejected run is retried from its next line, so a caption line above
    /// an aligned block does not hide the table.
    pub fn detect_grid(&self, markdown: &str) -> Result<Vec<TableRecord>> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut tables: Vec<TableRecord> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if !self.is_grid_line(lines[i]) {
                i += 1;
                continue;
            }

            let mut end = i;
            while end < lines.len() && self.is_grid_line(lines[end]) {
                end += 1;
            }
            if end - i < self.config.min_grid_lines {
                i = end;
                continue;
            }

            let rows: Vec<Vec<String>> = lines[i..end]
                .iter()
                .map(|line| {
                    self.grid_split
                        .split(line.trim())
                        .map(str::trim)
                        .filter(|cell| !cell.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .collect();

            let width = rows[0].len();
            let aligned = width >= self.config.min_grid_columns
                && rows.iter().all(|row| row.len() == width);
            if !aligned {
                i += 1;
                continue;
            }

            let mut rows = rows;
            let headers = rows.remove(0);
            let table_id = tables.len() + 1;
            let source = TableSource::Grid;
            if let Some(table) = TableRecord::build(
                format!("{}_{}", source.id_prefix(), table_id),
                format!("Grid Table {}", table_id),
                headers,
                rows,
                source.confidence(),
                source,
            ) {
                tables.push(table);
            }
            i = end;
        }

        Ok(tables)
    }

    /// Table from a structured content item, or `None` if its text is not a
    /// pipe-delimited table.
    pub fn from_item(&self, item: &ContentItem, idx: usize) -> Option<TableRecord> {
        let text = item.text.trim();
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 2 || !lines[0].contains('|') {
            return None;
        }

        let headers = split_item_row(lines[0]);
        let rows: Vec<Vec<String>> = lines[1..]
            .iter()
            .filter(|line| line.contains('|'))
            .map(|line| split_item_row(line))
            .filter(|row| !is_separator_row(row))
            .collect();

        let source = TableSource::ContentItem;
        TableRecord::build(
            format!("{}_{}", source.id_prefix(), idx),
            format!("Table {}", idx + 1),
            headers,
            rows,
            source.confidence(),
            source,
        )
        .map(|table| table.with_position(item.bbox, item.page_idx))
    }

    fn cell_text(&self, html: &str) -> String {
        let stripped = self.html_tag.replace_all(html, "");
        html_escape::decode_html_entities(&stripped).trim().to_string()
    }

    fn is_grid_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.contains('|')
            && !self.box_line.is_match(trimmed)
            && self.grid_line.is_match(trimmed)
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Cells between pipes, without the empty segments outside the outer pipes.
fn split_pipe_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Non-empty cells of a content-item table line.
fn split_item_row(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_separator_row(row: &[String]) -> bool {
    !row.is_empty()
        && row
            .iter()
            .all(|cell| cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':' | ' ')))
}
