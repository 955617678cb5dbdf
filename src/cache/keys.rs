//! Cache key definitions.
//!
//! Every tier is keyed by the SHA-256 digest of the source content, hex
//! encoded, so keys have a fixed length no matter how large the input is.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the content a cache entry was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three independent stores making up the content cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    /// HTML to Markdown conversions. Cheapest to regenerate.
    Markdown,
    /// Fully styled documents.
    Document,
    /// Parsed content element lists.
    Elements,
}

impl CacheTier {
    pub const ALL: [CacheTier; 3] = [CacheTier::Markdown, CacheTier::Document, CacheTier::Elements];

    /// Metric label value.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheTier::Markdown => "markdown",
            CacheTier::Document => "document",
            CacheTier::Elements => "elements",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_hex() {
        let first = ContentHash::of("<p>hello</p>");
        let second = ContentHash::of("<p>hello</p>");

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_content_gives_different_keys() {
        assert_ne!(ContentHash::of("a"), ContentHash::of("b"));
        assert_eq!(
            ContentHash::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
