//! Markdown to [`StyledDocument`] rendering.
//!
//! A single forward pass over the input lines. Multi-line blocks (fenced code,
//! postscript asides, tables) are consumed in one step. Nothing here fails:
//! structure the scanner does not recognise is rendered as a plain paragraph.

mod inline;
mod table;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{FontWeight, StyledDocument, Stylesheet, TextStyle};

pub(crate) use inline::render_inline;
use table::{TableBlock, is_table_line};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#+)\s+(.*)$").expect("heading pattern must compile"));
static UNORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[-*] (.*)$").expect("list pattern must compile"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(\d+)\.\s+(.*)$").expect("list pattern must compile"));
static CHECKBOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([ xX])\](?:\s+(.*))?$").expect("checkbox pattern must compile"));

const FENCE: &str = "```";
const POSTSCRIPT_OPEN: &str = ":::postscript";
const POSTSCRIPT_CLOSE: &str = ":::/postscript";
const POSTSCRIPT_HEADER: &str = "::header::";
const HORIZONTAL_RULE: &str = "---";

/// Heading depth (number of `#`) and the text after the marker.
pub(crate) fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let captures = HEADING.captures(line)?;
    let depth = captures.get(1)?.as_str().len();
    let text = captures.get(2).map_or("", |text| text.as_str());
    Some((depth, text.trim_end()))
}

/// Info string of a fence line (possibly empty), or `None` if `line` is not a fence.
pub(crate) fn parse_fence(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix(FENCE).map(str::trim)
}

/// Raw lines of a fenced block starting at `lines[open]`, plus the index of
/// the first line after the block. An unterminated fence runs to the end.
pub(crate) fn fenced_lines<'a>(lines: &[&'a str], open: usize) -> (Vec<&'a str>, usize) {
    let body_start = open + 1;
    let close = lines[body_start..]
        .iter()
        .position(|line| parse_fence(line).is_some())
        .map(|offset| body_start + offset);

    match close {
        Some(close) => (lines[body_start..close].to_vec(), close + 1),
        None => (lines[body_start..].to_vec(), lines.len()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListMarker<'a> {
    Bullet,
    Ordered(&'a str),
    Checkbox { checked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListItem<'a> {
    pub indent: &'a str,
    pub marker: ListMarker<'a>,
    pub text: &'a str,
}

/// Recognise `- item`, `* item`, `1. item` and their checkbox forms.
pub(crate) fn parse_list_item(line: &str) -> Option<ListItem<'_>> {
    let (indent, marker, rest) = if let Some(captures) = UNORDERED_ITEM.captures(line) {
        (captures.get(1)?, ListMarker::Bullet, captures.get(2)?)
    } else {
        let captures = ORDERED_ITEM.captures(line)?;
        let number = captures.get(2)?.as_str();
        (captures.get(1)?, ListMarker::Ordered(number), captures.get(3)?)
    };

    let rest = rest.as_str();
    let (marker, text) = match CHECKBOX.captures(rest) {
        Some(checkbox) => {
            let checked = checkbox.get(1).is_some_and(|mark| mark.as_str() != " ");
            let text = checkbox.get(2).map_or("", |text| text.as_str());
            (ListMarker::Checkbox { checked }, text)
        }
        None => (marker, rest),
    };

    Some(ListItem {
        indent: indent.as_str(),
        marker,
        text,
    })
}

/// Render `markdown` with `stylesheet`. Never fails.
pub fn render_markdown(markdown: &str, stylesheet: &Stylesheet) -> StyledDocument {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut renderer = BlockRenderer {
        sheet: stylesheet,
        body: stylesheet.body_style(),
        document: StyledDocument::new(),
    };

    let mut index = 0;
    while index < lines.len() {
        index = renderer.block(&lines, index);
    }
    renderer.document
}

struct BlockRenderer<'s> {
    sheet: &'s Stylesheet,
    body: TextStyle,
    document: StyledDocument,
}

impl BlockRenderer<'_> {
    /// Render the block starting at `lines[index]` and return the index of
    /// the next unconsumed line.
    fn block(&mut self, lines: &[&str], index: usize) -> usize {
        let line = lines[index];

        if line.trim().is_empty() {
            if !self.document.is_empty() {
                self.document.push("\n", &self.body);
            }
            return index + 1;
        }

        if let Some((depth, text)) = parse_heading(line) {
            let style = self.sheet.heading_style(depth);
            render_inline(text, &style, self.sheet, &mut self.document);
            self.document.push("\n\n", &style);
            return index + 1;
        }

        if parse_fence(line).is_some() {
            let (code, next) = fenced_lines(lines, index);
            self.code_block(&code);
            return next;
        }

        if line.trim() == POSTSCRIPT_OPEN {
            return self.postscript(lines, index);
        }

        if line.starts_with('>') {
            self.blockquote(line);
            return index + 1;
        }

        if let Some(item) = parse_list_item(line) {
            self.list_item(&item);
            return index + 1;
        }

        if line.trim_end() == HORIZONTAL_RULE {
            let rule = &self.sheet.horizontal_rule;
            let style = self.body.clone().with_foreground(rule.color);
            let glyphs = rule.glyph.to_string().repeat(rule.width);
            self.document.push(format!("\n{glyphs}\n\n"), &style);
            return index + 1;
        }

        if is_table_line(line) {
            let (table, consumed) = TableBlock::collect(&lines[index..]);
            table.render(self.sheet, &mut self.document);
            return index + consumed;
        }

        render_inline(line, &self.body, self.sheet, &mut self.document);
        if index + 1 < lines.len() {
            self.document.push("\n", &self.body);
        }
        index + 1
    }

    fn code_block(&mut self, code: &[&str]) {
        let code_sheet = &self.sheet.code;
        let mut style = TextStyle::new(code_sheet.font_size, self.sheet.body.color)
            .with_background(code_sheet.background);
        style.monospace = true;

        let mut text = code.join("\n");
        text.push('\n');
        self.document.push(text, &style);
    }

    fn postscript(&mut self, lines: &[&str], open: usize) -> usize {
        let sheet = &self.sheet.postscript;
        let body_start = open + 1;
        let close = lines[body_start..]
            .iter()
            .position(|line| line.trim() == POSTSCRIPT_CLOSE)
            .map(|offset| body_start + offset);
        let end = close.unwrap_or(lines.len());

        let mut header = None;
        let mut content = Vec::new();
        for line in &lines[body_start..end] {
            match line.trim_start().strip_prefix(POSTSCRIPT_HEADER) {
                Some(text) => header = Some(text.trim()),
                None => content.push(*line),
            }
        }

        let aside = self.body.clone().with_foreground(sheet.color);
        if let Some(header) = header {
            let header_style = self
                .body
                .clone()
                .with_foreground(sheet.header_color)
                .with_weight(FontWeight::Bold);
            self.document.push(sheet.border.as_str(), &aside);
            render_inline(header, &header_style, self.sheet, &mut self.document);
            self.document.push("\n", &header_style);
        }
        for line in content {
            self.document.push(sheet.border.as_str(), &aside);
            render_inline(line, &aside, self.sheet, &mut self.document);
            self.document.push("\n", &aside);
        }

        close.map_or(lines.len(), |close| close + 1)
    }

    fn blockquote(&mut self, line: &str) {
        let quote = &self.sheet.blockquote;
        let mut rest = line;
        let mut depth = 0;
        while let Some(stripped) = rest.strip_prefix('>') {
            depth += 1;
            rest = stripped.strip_prefix(' ').unwrap_or(stripped);
        }

        let border = self.body.clone().with_foreground(quote.border_color);
        let text_style = self.body.clone().with_foreground(quote.color);
        self.document.push(quote.border.repeat(depth), &border);
        render_inline(rest, &text_style, self.sheet, &mut self.document);
        self.document.push("\n", &text_style);
    }

    fn list_item(&mut self, item: &ListItem<'_>) {
        let list = &self.sheet.list;
        let marker_style = self.body.clone().with_foreground(list.marker_color);
        let marker = match item.marker {
            ListMarker::Bullet => list.bullet.clone(),
            ListMarker::Ordered(number) => format!("{number}. "),
            ListMarker::Checkbox { checked: true } => list.checked.clone(),
            ListMarker::Checkbox { checked: false } => list.unchecked.clone(),
        };

        self.document.push(item.indent, &self.body);
        self.document.push(marker, &marker_style);
        render_inline(item.text, &self.body, self.sheet, &mut self.document);
        self.document.push("\n", &self.body);
    }
}
