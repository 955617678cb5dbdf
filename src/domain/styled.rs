//! Styled text primitives produced by the markdown renderer.
//!
//! A [`StyledDocument`] is an ordered list of [`StyledRun`]s. Each run owns its
//! text and a fully-resolved [`TextStyle`]; consumers never need to consult the
//! stylesheet again to display a document.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::DomainError;

/// RGBA color. Serialized as `#rrggbb` (or `#rrggbbaa` when translucent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl FromStr for Color {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| DomainError::invalid_color(value))?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(DomainError::invalid_color(value));
        }

        let channel = |index: usize| {
            u8::from_str_radix(&hex[index..index + 2], 16)
                .map_err(|_| DomainError::invalid_color(value))
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl TryFrom<String> for Color {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Regular,
    Medium,
    Semibold,
    Bold,
}

/// Display attributes attached to a run of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font_size: f32,
    pub weight: FontWeight,
    pub italic: bool,
    pub monospace: bool,
    pub foreground: Color,
    pub background: Option<Color>,
    pub underline: bool,
    pub strikethrough: bool,
    /// Positive values raise the glyphs (superscript), negative lower them.
    pub baseline_offset: f32,
    pub link: Option<Url>,
}

impl TextStyle {
    pub fn new(font_size: f32, foreground: Color) -> Self {
        Self {
            font_size,
            weight: FontWeight::Regular,
            italic: false,
            monospace: false,
            foreground,
            background: None,
            underline: false,
            strikethrough: false,
            baseline_offset: 0.0,
            link: None,
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn is_bold(&self) -> bool {
        matches!(self.weight, FontWeight::Semibold | FontWeight::Bold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub style: TextStyle,
}

/// Ordered sequence of styled runs. Adjacent runs with identical styles are
/// merged on push.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StyledDocument {
    runs: Vec<StyledRun>,
}

impl StyledDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, style: &TextStyle) {
        let text = text.into();
        if text.is_empty() {
            return;
        }

        match self.runs.last_mut() {
            Some(last) if last.style == *style => last.text.push_str(&text),
            _ => self.runs.push(StyledRun {
                text,
                style: style.clone(),
            }),
        }
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated text with all styling discarded.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn char_count(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }

    /// Number of runs carrying a link target.
    pub fn link_count(&self) -> usize {
        self.runs.iter().filter(|run| run.style.link.is_some()).count()
    }
}
