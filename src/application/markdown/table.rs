//! Pipe tables.

use once_cell::sync::Lazy;
use regex::Regex;

use super::inline::render_inline;
use crate::domain::{StyledDocument, Stylesheet};

static SEPARATOR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s|:\-]+$").expect("separator pattern must compile"));

pub(crate) fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    line.contains('-') && SEPARATOR_ROW.is_match(line)
}

fn split_row(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

/// Rows of a table block with separator rows already dropped. The first row
/// is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableBlock<'a> {
    pub rows: Vec<Vec<&'a str>>,
    pub column_count: usize,
}

impl<'a> TableBlock<'a> {
    /// Collect the run of table lines at the start of `lines`. Returns the
    /// block and how many lines it consumed.
    pub fn collect(lines: &[&'a str]) -> (Self, usize) {
        let consumed = lines
            .iter()
            .take_while(|line| is_table_line(line))
            .count();

        let rows: Vec<Vec<&'a str>> = lines[..consumed]
            .iter()
            .copied()
            .filter(|line| !is_separator_row(line))
            .map(split_row)
            .collect();
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);

        (Self { rows, column_count }, consumed)
    }

    /// Short rows are padded with empty cells up to `column_count`.
    pub fn render(&self, sheet: &Stylesheet, document: &mut StyledDocument) {
        let body = sheet.body_style();
        let header = body.clone().with_weight(sheet.table.header_weight);
        let chrome = body.clone().with_foreground(sheet.table.separator_color);

        for (index, row) in self.rows.iter().enumerate() {
            let base = if index == 0 { &header } else { &body };
            for column in 0..self.column_count {
                if column > 0 {
                    document.push(sheet.table.cell_separator.as_str(), &chrome);
                }
                let cell = row.get(column).copied().unwrap_or_default();
                render_inline(cell, base, sheet, document);
            }
            document.push("\n", base);

            if index == 0 && self.rows.len() > 1 {
                let mut rule = sheet.table.rule_glyph.to_string().repeat(sheet.table.rule_width);
                rule.push('\n');
                document.push(rule, &chrome);
            }
        }
    }
}
