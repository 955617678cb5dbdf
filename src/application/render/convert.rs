//! HTML to Markdown conversion.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ConversionError;

/// The HTML to Markdown stage consumed by the render coordinator.
///
/// With `crash_on_unsupported_tags` set, a tag the converter cannot express
/// must be reported as [`ConversionError::UnsupportedTag`] instead of being
/// dropped.
pub trait HtmlConverter: Send + Sync {
    fn convert(&self, html: &str, crash_on_unsupported_tags: bool)
    -> Result<String, ConversionError>;
}

impl<F> HtmlConverter for F
where
    F: Fn(&str, bool) -> Result<String, ConversionError> + Send + Sync,
{
    fn convert(
        &self,
        html: &str,
        crash_on_unsupported_tags: bool,
    ) -> Result<String, ConversionError> {
        self(html, crash_on_unsupported_tags)
    }
}

static OPENING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)").expect("tag pattern must compile"));

/// Tags `html2md` turns into Markdown (or that are harmless wrappers).
const SUPPORTED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "del", "div", "em", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p", "pre", "s", "section",
    "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "th", "thead", "tr",
    "ul",
];

static SUPPORTED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SUPPORTED_TAGS.iter().copied().collect());

/// [`HtmlConverter`] backed by `html2md`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Html2MdConverter {
    fn first_unsupported_tag(html: &str) -> Option<String> {
        OPENING_TAG
            .captures_iter(html)
            .filter_map(|captures| captures.get(1))
            .map(|tag| tag.as_str().to_ascii_lowercase())
            .find(|tag| !SUPPORTED.contains(tag.as_str()))
    }
}

impl HtmlConverter for Html2MdConverter {
    fn convert(
        &self,
        html: &str,
        crash_on_unsupported_tags: bool,
    ) -> Result<String, ConversionError> {
        if crash_on_unsupported_tags && let Some(tag) = Self::first_unsupported_tag(html) {
            return Err(ConversionError::UnsupportedTag { tag });
        }
        Ok(html2md::parse_html(html).trim().to_string())
    }
}
