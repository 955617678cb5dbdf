//! Code block language detection.

use once_cell::sync::Lazy;
use syntect::parsing::SyntaxSet;

pub const PLAIN_TEXT: &str = "plaintext";

/// Guesses the language of an untagged code block.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, code: &str) -> String;
}

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Detection based on syntect's first-line heuristics (shebangs, XML
/// prologs, modelines and the like).
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectLanguageDetector;

impl LanguageDetector for SyntectLanguageDetector {
    fn detect(&self, code: &str) -> String {
        let first_line = code.lines().find(|line| !line.trim().is_empty());
        first_line
            .and_then(|line| SYNTAX_SET.find_syntax_by_first_line(line))
            .map(|syntax| syntax.name.to_ascii_lowercase())
            .unwrap_or_else(|| PLAIN_TEXT.to_string())
    }
}
