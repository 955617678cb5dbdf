//! Render pipeline.
//!
//! HTML arrives from the scraper, is converted to Markdown by an
//! [`HtmlConverter`], and is turned into content elements (or a single styled
//! document) by the pure renderers in `application::markdown` and
//! `application::elements`. [`RenderCoordinator`] ties those stages to the
//! content cache and deduplicates concurrent work.

mod convert;
mod coordinator;
mod language;
mod runtime;
mod types;

pub use convert::{Html2MdConverter, HtmlConverter};
pub use coordinator::RenderCoordinator;
pub use language::{LanguageDetector, PLAIN_TEXT, SyntectLanguageDetector};
pub use runtime::{InFlightRenders, SharedRender};
pub use types::{ConversionError, RenderError, RenderMetadata, RenderResult};
