//! Markdown to [`ContentElement`] segmentation.
//!
//! A reduced sibling of the markdown renderer: only headings, fenced code,
//! standalone images and paragraphs are recognised. Everything else (lists,
//! quotes, tables, postscript asides) ends up inside paragraph text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::application::markdown::{fenced_lines, parse_fence, parse_heading, render_inline};
use crate::application::render::{LanguageDetector, SyntectLanguageDetector};
use crate::domain::{ContentElement, RenderConfiguration, StyledDocument};

static IMAGE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^!\[([^\]]*)\]\(([^)\s]*)\)$").expect("image pattern must compile")
});

pub struct ElementParser {
    detector: Arc<dyn LanguageDetector>,
}

impl Default for ElementParser {
    fn default() -> Self {
        Self::new(Arc::new(SyntectLanguageDetector))
    }
}

impl ElementParser {
    pub fn new(detector: Arc<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    /// One element per recognised block. Blank lines separate blocks and
    /// produce nothing themselves.
    pub fn parse(&self, markdown: &str, configuration: &RenderConfiguration) -> Vec<ContentElement> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut elements = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];

            if line.trim().is_empty() {
                index += 1;
                continue;
            }

            if let Some((depth, text)) = parse_heading(line) {
                let level = u8::try_from(depth).unwrap_or(u8::MAX);
                elements.push(ContentElement::heading(text, level));
                index += 1;
                continue;
            }

            if let Some(tag) = parse_fence(line) {
                let (code, next) = fenced_lines(&lines, index);
                elements.push(self.code_block(tag, &code.join("\n"), configuration));
                index = next;
                continue;
            }

            if let Some((alt, url)) = parse_image(line) {
                if configuration.enable_images {
                    elements.push(ContentElement::image(Url::parse(url).ok(), alt));
                } else if !alt.is_empty() {
                    let mut document = StyledDocument::new();
                    document.push(alt, &configuration.stylesheet.body_style());
                    elements.push(ContentElement::text(document));
                }
                index += 1;
                continue;
            }

            let end = paragraph_end(&lines, index);
            elements.push(paragraph(&lines[index..end], configuration));
            index = end;
        }

        elements
    }

    fn code_block(
        &self,
        tag: &str,
        code: &str,
        configuration: &RenderConfiguration,
    ) -> ContentElement {
        let language = if !tag.is_empty() {
            Some(tag.to_string())
        } else if configuration.enable_code_highlighting {
            Some(self.detector.detect(code))
        } else {
            None
        };
        ContentElement::code_block(code, language)
    }
}

fn parse_image(line: &str) -> Option<(&str, &str)> {
    let captures = IMAGE_LINE.captures(line.trim())?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// A paragraph runs until a blank line or the start of another block.
fn paragraph_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 1;
    while let Some(line) = lines.get(end) {
        let starts_block = line.trim().is_empty()
            || parse_heading(line).is_some()
            || parse_fence(line).is_some()
            || parse_image(line).is_some();
        if starts_block {
            break;
        }
        end += 1;
    }
    end
}

fn paragraph(lines: &[&str], configuration: &RenderConfiguration) -> ContentElement {
    let sheet = configuration.stylesheet.as_ref();
    let body = sheet.body_style();
    let mut document = StyledDocument::new();
    for (offset, line) in lines.iter().enumerate() {
        if offset > 0 {
            document.push("\n", &body);
        }
        render_inline(line, &body, sheet, &mut document);
    }
    ContentElement::text(document)
}
