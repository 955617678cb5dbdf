//! Immutable value types shared by the renderer, parser, cache and coordinator.

pub mod elements;
pub mod error;
pub mod styled;
pub mod stylesheet;

pub use elements::{ContentElement, ElementKind};
pub use error::DomainError;
pub use styled::{Color, FontWeight, StyledDocument, StyledRun, TextStyle};
pub use stylesheet::{ImageQuality, RenderConfiguration, Stylesheet};
