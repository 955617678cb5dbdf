//! Inline construct scanning within a single line or table cell.
//!
//! Each step picks the leftmost construct in the remaining text. When two
//! constructs start at the same byte the earlier entry in [`PATTERNS`] wins,
//! which is how `**bold**` beats the `*bold*` italic match nested inside it.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::application::mentions;
use crate::domain::{FontWeight, StyledDocument, Stylesheet, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Bold,
    Italic,
    Code,
    Link,
    Mention,
    Strikethrough,
    Highlight,
    Underline,
    Superscript,
    Subscript,
}

/// Constructs in priority order. Mentions have no pattern of their own and
/// go through the mention scanner.
static PATTERNS: Lazy<Vec<(InlineKind, Option<Regex>)>> = Lazy::new(|| {
    [
        (InlineKind::Bold, Some(r"\*\*(.+?)\*\*")),
        (InlineKind::Italic, Some(r"\*([^*]+)\*")),
        (InlineKind::Code, Some(r"`([^`]+)`")),
        (InlineKind::Link, Some(r"\[([^\]]+)\]\(([^)\s]+)\)")),
        (InlineKind::Mention, None),
        (InlineKind::Strikethrough, Some(r"~~(.+?)~~")),
        (InlineKind::Highlight, Some(r"==(.+?)==")),
        (InlineKind::Underline, Some(r"<u>(.+?)</u>")),
        (InlineKind::Superscript, Some(r"<sup>(.+?)</sup>")),
        (InlineKind::Subscript, Some(r"<sub>(.+?)</sub>")),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let regex = pattern.map(|p| Regex::new(p).expect("inline pattern must compile"));
        (kind, regex)
    })
    .collect()
});

#[derive(Debug, Clone)]
struct InlineMatch<'t> {
    kind: InlineKind,
    range: Range<usize>,
    content: &'t str,
    target: Option<&'t str>,
}

/// Last search result for one entry of [`PATTERNS`].
#[derive(Debug, Clone)]
enum Slot<'t> {
    Unsearched,
    Found(InlineMatch<'t>),
    Exhausted,
}

/// Leftmost-construct search over a whole line.
///
/// Every kind remembers its next match. A remembered match is still the
/// leftmost one for its kind as long as it starts at or after the scan
/// position, so only kinds whose match was consumed or overlapped get
/// searched again, and a kind with no match left is never searched again.
struct InlineScanner<'t> {
    text: &'t str,
    slots: Vec<Slot<'t>>,
}

impl<'t> InlineScanner<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            slots: vec![Slot::Unsearched; PATTERNS.len()],
        }
    }

    fn next_construct(&mut self, offset: usize) -> Option<InlineMatch<'t>> {
        let text = self.text;
        for ((kind, regex), slot) in PATTERNS.iter().zip(self.slots.iter_mut()) {
            let stale = match slot {
                Slot::Unsearched => true,
                Slot::Found(found) => found.range.start < offset,
                Slot::Exhausted => false,
            };
            if stale {
                let found = match regex {
                    Some(regex) => find_pattern(*kind, regex, text, offset),
                    None => find_mention(text, offset),
                };
                *slot = found.map_or(Slot::Exhausted, Slot::Found);
            }
        }

        let mut best = None;
        for slot in &self.slots {
            if let Slot::Found(candidate) = slot {
                prefer_leftmost(&mut best, candidate);
            }
        }
        best.cloned()
    }
}

/// Append `text` to `document`, styling inline constructs on top of `base`.
pub(crate) fn render_inline(
    text: &str,
    base: &TextStyle,
    sheet: &Stylesheet,
    document: &mut StyledDocument,
) {
    let mut scanner = InlineScanner::new(text);
    let mut offset = 0;
    while offset < text.len() {
        let Some(found) = scanner.next_construct(offset) else {
            document.push(&text[offset..], base);
            break;
        };

        document.push(&text[offset..found.range.start], base);
        emit_construct(&found, base, sheet, document);
        offset = found.range.end;
    }
}

// Candidates arrive in priority order, so only a strictly earlier start replaces.
fn prefer_leftmost<'a, 't>(
    best: &mut Option<&'a InlineMatch<'t>>,
    candidate: &'a InlineMatch<'t>,
) {
    let replace = best.is_none_or(|current| candidate.range.start < current.range.start);
    if replace {
        *best = Some(candidate);
    }
}

fn find_pattern<'t>(
    kind: InlineKind,
    regex: &Regex,
    text: &'t str,
    offset: usize,
) -> Option<InlineMatch<'t>> {
    let captures = regex.captures_at(text, offset)?;
    let whole = captures.get(0)?;
    let content = captures.get(1)?;
    Some(InlineMatch {
        kind,
        range: whole.range(),
        content: content.as_str(),
        target: captures.get(2).map(|target| target.as_str()),
    })
}

fn find_mention(text: &str, offset: usize) -> Option<InlineMatch<'_>> {
    let range = mentions::next_mention(text, offset)?;
    Some(InlineMatch {
        kind: InlineKind::Mention,
        content: &text[range.clone()],
        range,
        target: None,
    })
}

fn emit_construct(
    found: &InlineMatch<'_>,
    base: &TextStyle,
    sheet: &Stylesheet,
    document: &mut StyledDocument,
) {
    let mut style = base.clone();
    match found.kind {
        InlineKind::Bold => style.weight = FontWeight::Bold,
        InlineKind::Italic => style.italic = true,
        InlineKind::Code => {
            style.font_size = sheet.code.font_size;
            style.monospace = true;
            style.foreground = sheet.code.color;
            style.background = Some(sheet.code.background);
        }
        InlineKind::Link => {
            // Unparseable targets (relative paths, junk) keep the base style.
            if let Some(url) = found.target.and_then(|target| Url::parse(target).ok()) {
                style.link = Some(url);
                style.foreground = sheet.link.color;
                style.underline = sheet.link.underline;
            }
        }
        InlineKind::Mention => {
            style.foreground = sheet.mention.color;
            style.background = Some(sheet.mention.background);
            style.weight = sheet.mention.weight;
        }
        InlineKind::Strikethrough => style.strikethrough = true,
        InlineKind::Highlight => style.background = Some(sheet.highlight.background),
        InlineKind::Underline => style.underline = true,
        InlineKind::Superscript => {
            style.font_size = base.font_size * sheet.script.scale;
            style.baseline_offset = base.font_size * sheet.script.superscript_offset;
        }
        InlineKind::Subscript => {
            style.font_size = base.font_size * sheet.script.scale;
            style.baseline_offset = -base.font_size * sheet.script.subscript_offset;
        }
    }

    document.push(found.content, &style);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> StyledDocument {
        let sheet = Stylesheet::default();
        let mut document = StyledDocument::new();
        render_inline(text, &sheet.body_style(), &sheet, &mut document);
        document
    }

    fn run_texts(document: &StyledDocument) -> Vec<&str> {
        document.runs().iter().map(|run| run.text.as_str()).collect()
    }

    #[test]
    fn plain_text_is_emitted_verbatim() {
        let document = render("nothing special here");
        assert_eq!(run_texts(&document), ["nothing special here"]);
    }

    #[test]
    fn bold_wins_over_nested_italic() {
        let document = render("a **b** c");
        assert_eq!(run_texts(&document), ["a ", "b", " c"]);
        assert!(document.runs()[1].style.is_bold());
        assert!(!document.runs()[1].style.italic);
    }

    #[test]
    fn leftmost_construct_is_taken_first() {
        let document = render("`code` then **bold**");
        assert_eq!(run_texts(&document), ["code", " then ", "bold"]);
        assert!(document.runs()[0].style.monospace);
        assert!(document.runs()[2].style.is_bold());
    }

    #[test]
    fn links_carry_their_target() {
        let document = render("see [docs](https://example.com/docs) now");
        let link = &document.runs()[1];
        assert_eq!(link.text, "docs");
        assert_eq!(
            link.style.link.as_ref().map(Url::as_str),
            Some("https://example.com/docs")
        );
        assert!(link.style.underline);
    }

    #[test]
    fn unparseable_link_target_degrades_to_plain_text() {
        let document = render("see [profile](/u/bob)");
        assert_eq!(document.plain_text(), "see profile");
        assert_eq!(document.runs().len(), 1);
        assert!(document.runs()[0].style.link.is_none());
    }

    #[test]
    fn mentions_are_highlighted_but_emails_are_not() {
        let sheet = Stylesheet::default();
        let document = render("ping @bob, not a@b.com");
        let mention = &document.runs()[1];
        assert_eq!(mention.text, "@bob");
        assert_eq!(mention.style.foreground, sheet.mention.color);
        assert_eq!(mention.style.background, Some(sheet.mention.background));
        assert_eq!(document.runs()[2].text, ", not a@b.com");
    }

    #[test]
    fn decorations_set_their_flags() {
        let document = render("~~gone~~ ==marked== <u>under</u>");
        let runs = document.runs();
        assert!(runs[0].style.strikethrough);
        assert!(runs[2].style.background.is_some());
        assert!(runs[4].style.underline);
    }

    #[test]
    fn scripts_shrink_and_shift_the_baseline() {
        let sheet = Stylesheet::default();
        let body = sheet.body_style();
        let document = render("x<sup>2</sup> H<sub>2</sub>O");
        let runs = document.runs();

        assert_eq!(runs[1].text, "2");
        assert_eq!(runs[1].style.font_size, body.font_size * sheet.script.scale);
        assert!(runs[1].style.baseline_offset > 0.0);
        assert_eq!(runs[3].text, "2");
        assert!(runs[3].style.baseline_offset < 0.0);
        assert_eq!(document.plain_text(), "x2 H2O");
    }

    #[test]
    fn long_lines_keep_every_construct() {
        let document = render(&"**b** @u `c` ".repeat(2000));
        assert_eq!(document.runs().len(), 6 * 2000);
        assert!(document.runs()[6 * 1999].style.is_bold());
        assert_eq!(document.runs()[6 * 1999 + 2].text, "@u");
        assert!(document.runs()[6 * 1999 + 4].style.monospace);

        let document = render(&"@uI ".repeat(5000));
        assert_eq!(document.runs().len(), 2 * 5000);
        assert_eq!(document.plain_text(), "@uI ".repeat(5000));
    }

    #[test]
    fn constructs_after_an_unmatched_kind_are_still_found() {
        let document = render("`a` **b** `c` ~~d~~ **e");
        assert_eq!(
            run_texts(&document),
            ["a", " ", "b", " ", "c", " ", "d", " **e"]
        );
        assert!(document.runs()[4].style.monospace);
        assert!(document.runs()[6].style.strikethrough);
    }

    #[test]
    fn unterminated_markers_stay_literal() {
        let document = render("unclosed **oops and ~~gone");
        assert_eq!(document.runs().len(), 1);
        assert_eq!(document.plain_text(), "unclosed **oops and ~~gone");
    }
}
