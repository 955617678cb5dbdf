use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::ContentElement;

/// Failure reported by the HTML to Markdown stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unsupported tag <{tag}>")]
    UnsupportedTag { tag: String },
    #[error("html conversion failed: {message}")]
    Failed { message: String },
}

impl ConversionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Structured errors surfaced by a render episode. Every awaiter of the same
/// episode observes the same value, so the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("rendering failed: {message}")]
    RenderingFailed { message: String },
    #[error("render cancelled")]
    Cancelled,
}

impl RenderError {
    pub fn rendering_failed(message: impl Into<String>) -> Self {
        Self::RenderingFailed {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }
}

/// Measurements taken while producing a [`RenderResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderMetadata {
    #[serde(serialize_with = "serialize_millis")]
    pub render_time: Duration,
    /// Input length in bytes.
    pub html_length: usize,
    /// Length in bytes of the Markdown the elements were parsed from.
    pub markdown_length: usize,
    pub cache_hit: bool,
    pub image_count: usize,
    pub link_count: usize,
    pub mention_count: usize,
}

/// Elements plus metadata for one completed render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResult {
    pub elements: Arc<Vec<ContentElement>>,
    pub metadata: RenderMetadata,
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
