//! Render coordination: cache lookups, conversion, parsing and in-flight
//! deduplication.
//!
//! Each distinct HTML input is rendered by at most one episode at a time.
//! Concurrent requests for the same input attach to the running episode and
//! all observe its single outcome. Cache writes happen only once an episode
//! has produced its final value, so failed or cancelled episodes leave the
//! cache untouched.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::elements::ElementParser;
use crate::application::markdown::render_markdown;
use crate::application::mentions;
use crate::cache::{CacheStatistics, CacheTier, ContentCache, ContentHash};
use crate::domain::{ContentElement, ElementKind, RenderConfiguration, StyledDocument};

use super::convert::{Html2MdConverter, HtmlConverter};
use super::runtime::InFlightRenders;
use super::types::{RenderError, RenderMetadata, RenderResult};

const METRIC_DEDUP: &str = "forumdown_render_dedup_total";
const METRIC_CANCELLED: &str = "forumdown_render_cancelled_total";
const METRIC_RENDER_MS: &str = "forumdown_render_ms";

pub struct RenderCoordinator {
    cache: Arc<ContentCache>,
    converter: Arc<dyn HtmlConverter>,
    parser: Arc<ElementParser>,
    renders: InFlightRenders<RenderResult>,
    documents: InFlightRenders<Arc<StyledDocument>>,
}

impl RenderCoordinator {
    pub fn new(
        cache: Arc<ContentCache>,
        converter: Arc<dyn HtmlConverter>,
        parser: ElementParser,
    ) -> Self {
        Self {
            cache,
            converter,
            parser: Arc::new(parser),
            renders: InFlightRenders::new(),
            documents: InFlightRenders::new(),
        }
    }

    /// Coordinator using `html2md` for conversion and syntect for language
    /// detection.
    pub fn with_cache(cache: Arc<ContentCache>) -> Self {
        Self::new(cache, Arc::new(Html2MdConverter), ElementParser::default())
    }

    /// Render `html` into content elements.
    ///
    /// Requests for input that is already being rendered attach to that
    /// episode; the configuration of the request that started it applies.
    pub async fn render(
        &self,
        html: &str,
        configuration: &RenderConfiguration,
    ) -> Result<RenderResult, RenderError> {
        let (outcome, attached) = self.renders.join(ContentHash::of(html), |token| {
            self.episode(html, configuration, token).render_elements()
        });
        if attached {
            counter!(METRIC_DEDUP, "path" => "elements").increment(1);
            debug!(html_length = html.len(), "Attached to in-flight render");
        }
        outcome.await
    }

    /// Render `html` into a single styled document, using the Markdown and
    /// styled-document tiers.
    pub async fn render_document(
        &self,
        html: &str,
        configuration: &RenderConfiguration,
    ) -> Result<Arc<StyledDocument>, RenderError> {
        let (outcome, attached) = self.documents.join(ContentHash::of(html), |token| {
            self.episode(html, configuration, token).render_document()
        });
        if attached {
            counter!(METRIC_DEDUP, "path" => "document").increment(1);
            debug!(html_length = html.len(), "Attached to in-flight document render");
        }
        outcome.await
    }

    /// Cancel any in-flight render of `html`. Returns whether one was running.
    pub fn cancel(&self, html: &str) -> bool {
        let key = ContentHash::of(html);
        let cancelled = usize::from(self.renders.cancel(&key)) + usize::from(self.documents.cancel(&key));
        if cancelled > 0 {
            counter!(METRIC_CANCELLED).increment(cancelled as u64);
            info!(key = %key, "Cancelled in-flight render");
        }
        cancelled > 0
    }

    /// Cancel every in-flight render. Returns how many episodes were cancelled.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.renders.cancel_all() + self.documents.cancel_all();
        if cancelled > 0 {
            counter!(METRIC_CANCELLED).increment(cancelled as u64);
            info!(cancelled, "Cancelled all in-flight renders");
        }
        cancelled
    }

    pub fn in_flight_count(&self) -> usize {
        self.renders.len() + self.documents.len()
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Clear one tier, or every tier (and the statistics) when `tier` is `None`.
    pub fn clear_cache(&self, tier: Option<CacheTier>) {
        match tier {
            Some(tier) => self.cache.clear(tier),
            None => self.cache.clear_all(),
        }
    }

    fn episode(
        &self,
        html: &str,
        configuration: &RenderConfiguration,
        token: CancellationToken,
    ) -> Episode {
        Episode {
            html: Arc::from(html),
            configuration: configuration.clone(),
            cache: Arc::clone(&self.cache),
            converter: Arc::clone(&self.converter),
            parser: Arc::clone(&self.parser),
            token,
        }
    }
}

/// Everything one render episode needs, owned so it can run on its own task.
struct Episode {
    html: Arc<str>,
    configuration: RenderConfiguration,
    cache: Arc<ContentCache>,
    converter: Arc<dyn HtmlConverter>,
    parser: Arc<ElementParser>,
    token: CancellationToken,
}

impl Episode {
    fn caching(&self) -> bool {
        self.configuration.enable_caching
    }

    async fn render_elements(self) -> Result<RenderResult, RenderError> {
        let started = Instant::now();

        if self.caching()
            && let Some(elements) = self.cache.get_elements(&self.html)
        {
            let markdown_length = self
                .cache
                .peek_markdown(&self.html)
                .map_or(0, |markdown| markdown.len());
            return Ok(self.finish(elements, markdown_length, true, started));
        }

        let (markdown, converted) = self.markdown().await?;
        let elements = self.parse(Arc::clone(&markdown)).await?;

        if self.caching() && !self.token.is_cancelled() {
            if converted {
                self.cache.set_markdown(&self.html, Arc::clone(&markdown));
            }
            self.cache.set_elements(&self.html, Arc::clone(&elements));
        }

        Ok(self.finish(elements, markdown.len(), false, started))
    }

    async fn render_document(self) -> Result<Arc<StyledDocument>, RenderError> {
        let started = Instant::now();

        if self.caching()
            && let Some(document) = self.cache.get_document(&self.html)
        {
            return Ok(document);
        }

        let (markdown, converted) = self.markdown().await?;
        let stylesheet = Arc::clone(&self.configuration.stylesheet);
        let source = Arc::clone(&markdown);
        let document = tokio::task::spawn_blocking(move || render_markdown(&source, &stylesheet))
            .await
            .map_err(|err| RenderError::rendering_failed(format!("styling task failed: {err}")))?;
        let document = Arc::new(document);

        if self.caching() && !self.token.is_cancelled() {
            if converted {
                self.cache.set_markdown(&self.html, Arc::clone(&markdown));
            }
            self.cache.set_document(&self.html, Arc::clone(&document));
        }

        histogram!(METRIC_RENDER_MS, "path" => "document")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        Ok(document)
    }

    /// Cached Markdown for the input, or a fresh conversion. The flag is
    /// `true` for a fresh conversion that still has to be stored.
    async fn markdown(&self) -> Result<(Arc<String>, bool), RenderError> {
        if self.caching()
            && let Some(markdown) = self.cache.get_markdown(&self.html)
        {
            return Ok((markdown, false));
        }

        let converter = Arc::clone(&self.converter);
        let html = Arc::clone(&self.html);
        let strict = self.configuration.crash_on_unsupported_tags;
        let converted = tokio::task::spawn_blocking(move || converter.convert(&html, strict))
            .await
            .map_err(|err| {
                RenderError::rendering_failed(format!("conversion task failed: {err}"))
            })?;

        match converted {
            Ok(markdown) => Ok((Arc::new(markdown), true)),
            Err(err) => {
                warn!(error = %err, strict, html_length = self.html.len(), "HTML conversion failed");
                Err(err.into())
            }
        }
    }

    async fn parse(&self, markdown: Arc<String>) -> Result<Arc<Vec<ContentElement>>, RenderError> {
        let parser = Arc::clone(&self.parser);
        let configuration = self.configuration.clone();
        let elements = tokio::task::spawn_blocking(move || parser.parse(&markdown, &configuration))
            .await
            .map_err(|err| RenderError::rendering_failed(format!("parser task failed: {err}")))?;
        Ok(Arc::new(elements))
    }

    fn finish(
        &self,
        elements: Arc<Vec<ContentElement>>,
        markdown_length: usize,
        cache_hit: bool,
        started: Instant,
    ) -> RenderResult {
        let image_count = elements.iter().filter(|element| element.is_image()).count();
        let link_count = elements.iter().map(ContentElement::link_count).sum();
        let mention_count = elements
            .iter()
            .filter(|element| !matches!(element.kind, ElementKind::CodeBlock { .. }))
            .map(|element| mentions::mentions(&element.plain_text()).count())
            .sum();

        let render_time = started.elapsed();
        histogram!(METRIC_RENDER_MS, "path" => "elements")
            .record(render_time.as_secs_f64() * 1000.0);
        debug!(
            cache_hit,
            elements = elements.len(),
            elapsed_ms = render_time.as_millis() as u64,
            "Render episode finished"
        );

        RenderResult {
            metadata: RenderMetadata {
                render_time,
                html_length: self.html.len(),
                markdown_length,
                cache_hit,
                image_count,
                link_count,
                mention_count,
            },
            elements,
        }
    }
}
