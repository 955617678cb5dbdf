//! Content elements produced by the element parser.

use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::styled::StyledDocument;

/// One rendered block. `id` is stable for the lifetime of the element so
/// consumers can diff element lists between renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentElement {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text {
        document: StyledDocument,
    },
    CodeBlock {
        code: String,
        language: Option<String>,
    },
    Image {
        url: Option<Url>,
        alt_text: String,
    },
    Heading {
        text: String,
        level: u8,
    },
}

impl ContentElement {
    fn new(kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn text(document: StyledDocument) -> Self {
        Self::new(ElementKind::Text { document })
    }

    pub fn code_block(code: impl Into<String>, language: Option<String>) -> Self {
        Self::new(ElementKind::CodeBlock {
            code: code.into(),
            language,
        })
    }

    pub fn image(url: Option<Url>, alt_text: impl Into<String>) -> Self {
        Self::new(ElementKind::Image {
            url,
            alt_text: alt_text.into(),
        })
    }

    /// Levels outside 1..=6 are stored as level 1.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let level = if (1..=6).contains(&level) { level } else { 1 };
        Self::new(ElementKind::Heading {
            text: text.into(),
            level,
        })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image { .. })
    }

    /// Textual content without styling; images contribute their alt text.
    pub fn plain_text(&self) -> String {
        match &self.kind {
            ElementKind::Text { document } => document.plain_text(),
            ElementKind::CodeBlock { code, .. } => code.clone(),
            ElementKind::Image { alt_text, .. } => alt_text.clone(),
            ElementKind::Heading { text, .. } => text.clone(),
        }
    }

    pub fn link_count(&self) -> usize {
        match &self.kind {
            ElementKind::Text { document } => document.link_count(),
            _ => 0,
        }
    }
}
