//! Stylesheet and per-render configuration.
//!
//! Every size, color and glyph the renderer emits comes from here. All groups
//! deserialize with defaults so a `[stylesheet]` config section only needs the
//! fields it overrides.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::styled::{Color, FontWeight, TextStyle};

const DEFAULT_TEXT: Color = Color::rgb(0x1f, 0x23, 0x28);
const DEFAULT_MUTED: Color = Color::rgb(0x65, 0x6d, 0x76);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stylesheet {
    /// Font sizes for heading levels 1 through 6.
    pub heading_sizes: [f32; 6],
    pub body: BodyStyle,
    pub code: CodeStyle,
    pub link: LinkStyle,
    pub mention: MentionStyle,
    pub blockquote: BlockquoteStyle,
    pub table: TableStyle,
    pub list: ListStyle,
    pub postscript: PostscriptStyle,
    pub horizontal_rule: RuleStyle,
    pub highlight: HighlightStyle,
    pub script: ScriptStyle,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            heading_sizes: [28.0, 24.0, 20.0, 18.0, 16.0, 15.0],
            body: BodyStyle::default(),
            code: CodeStyle::default(),
            link: LinkStyle::default(),
            mention: MentionStyle::default(),
            blockquote: BlockquoteStyle::default(),
            table: TableStyle::default(),
            list: ListStyle::default(),
            postscript: PostscriptStyle::default(),
            horizontal_rule: RuleStyle::default(),
            highlight: HighlightStyle::default(),
            script: ScriptStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyStyle {
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
}

impl Default for BodyStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            color: DEFAULT_TEXT,
            weight: FontWeight::Regular,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeStyle {
    pub font_size: f32,
    pub color: Color,
    pub background: Color,
}

impl Default for CodeStyle {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            color: Color::rgb(0xcf, 0x22, 0x2e),
            background: Color::rgb(0xf6, 0xf8, 0xfa),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkStyle {
    pub color: Color,
    pub underline: bool,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x09, 0x69, 0xda),
            underline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionStyle {
    pub color: Color,
    pub background: Color,
    pub weight: FontWeight,
}

impl Default for MentionStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x82, 0x50, 0xdf),
            background: Color::rgba(0x82, 0x50, 0xdf, 0x1f),
            weight: FontWeight::Semibold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockquoteStyle {
    pub border: String,
    pub border_color: Color,
    pub color: Color,
}

impl Default for BlockquoteStyle {
    fn default() -> Self {
        Self {
            border: "▎ ".to_string(),
            border_color: Color::rgb(0xd0, 0xd7, 0xde),
            color: DEFAULT_MUTED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStyle {
    pub cell_separator: String,
    pub rule_glyph: char,
    pub rule_width: usize,
    pub header_weight: FontWeight,
    pub separator_color: Color,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            cell_separator: " │ ".to_string(),
            rule_glyph: '─',
            rule_width: 24,
            header_weight: FontWeight::Bold,
            separator_color: DEFAULT_MUTED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListStyle {
    pub bullet: String,
    pub checked: String,
    pub unchecked: String,
    pub marker_color: Color,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self {
            bullet: "• ".to_string(),
            checked: "☑ ".to_string(),
            unchecked: "☐ ".to_string(),
            marker_color: DEFAULT_MUTED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostscriptStyle {
    pub border: String,
    pub color: Color,
    pub header_color: Color,
}

impl Default for PostscriptStyle {
    fn default() -> Self {
        Self {
            border: "┃ ".to_string(),
            color: DEFAULT_MUTED,
            header_color: DEFAULT_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleStyle {
    pub glyph: char,
    pub width: usize,
    pub color: Color,
}

impl Default for RuleStyle {
    fn default() -> Self {
        Self {
            glyph: '─',
            width: 32,
            color: Color::rgb(0xd0, 0xd7, 0xde),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub background: Color,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            background: Color::rgba(0xff, 0xeb, 0x3b, 0x66),
        }
    }
}

/// Superscript/subscript geometry, relative to the surrounding font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStyle {
    pub scale: f32,
    pub superscript_offset: f32,
    pub subscript_offset: f32,
}

impl Default for ScriptStyle {
    fn default() -> Self {
        Self {
            scale: 0.7,
            superscript_offset: 0.3,
            subscript_offset: 0.2,
        }
    }
}

impl Stylesheet {
    /// Heading size for `level`; levels outside 1..=6 use the level-1 size.
    pub fn heading_size(&self, level: usize) -> f32 {
        match level {
            1..=6 => self.heading_sizes[level - 1],
            _ => self.heading_sizes[0],
        }
    }

    pub fn body_style(&self) -> TextStyle {
        TextStyle::new(self.body.font_size, self.body.color).with_weight(self.body.weight)
    }

    pub fn heading_style(&self, level: usize) -> TextStyle {
        TextStyle::new(self.heading_size(level), self.body.color).with_weight(FontWeight::Bold)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let sizes = self
            .heading_sizes
            .iter()
            .chain([&self.body.font_size, &self.code.font_size]);
        if sizes.into_iter().any(|size| !size.is_finite() || *size <= 0.0) {
            return Err(DomainError::validation(
                "font sizes must be finite and greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.script.scale) || self.script.scale == 0.0 {
            return Err(DomainError::validation("script.scale must be in (0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Low,
    Medium,
    #[default]
    High,
    Original,
}

/// Options supplied with every render call.
#[derive(Debug, Clone)]
pub struct RenderConfiguration {
    pub stylesheet: Arc<Stylesheet>,
    pub enable_caching: bool,
    pub enable_images: bool,
    pub enable_code_highlighting: bool,
    pub image_quality: ImageQuality,
    /// Surface unsupported HTML tags as conversion errors instead of dropping them.
    pub crash_on_unsupported_tags: bool,
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        Self {
            stylesheet: Arc::new(Stylesheet::default()),
            enable_caching: true,
            enable_images: true,
            enable_code_highlighting: true,
            image_quality: ImageQuality::default(),
            crash_on_unsupported_tags: false,
        }
    }
}
