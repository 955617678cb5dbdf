//! Content cache.
//!
//! Three independent tiers keyed by the SHA-256 of the source content:
//!
//! - **Markdown**: HTML to Markdown conversions, cheapest to regenerate
//! - **Document**: styled documents rendered from Markdown
//! - **Elements**: content element lists produced by the element parser
//!
//! Lookups never fail; a missing entry is just a miss. Hit and miss counters
//! for all tiers share one mutex, while each tier store has its own lock.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! markdown_cost_limit = 16777216
//! markdown_count_limit = 200
//! pressure_escalation_ms = 1000
//! # ... see config.rs for all options
//! ```

mod config;
mod keys;
mod lock;
mod stats;
mod store;

use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{ContentElement, StyledDocument};

pub use config::{CacheConfig, TierLimits};
pub use keys::{CacheTier, ContentHash};
pub use stats::{CacheStatistics, TierCounters, TierStatistics};
pub use store::{CacheCost, DOCUMENT_CHAR_COST, ELEMENT_COST, TierStore};

use lock::mutex_lock;
use stats::CacheCounters;

const SOURCE: &str = "cache";
const METRIC_HIT: &str = "forumdown_cache_hit_total";
const METRIC_MISS: &str = "forumdown_cache_miss_total";

pub struct ContentCache {
    config: CacheConfig,
    markdown: TierStore<String>,
    documents: TierStore<StyledDocument>,
    elements: TierStore<Vec<ContentElement>>,
    counters: Mutex<CacheCounters>,
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            markdown: TierStore::new(CacheTier::Markdown, config.limits(CacheTier::Markdown)),
            documents: TierStore::new(CacheTier::Document, config.limits(CacheTier::Document)),
            elements: TierStore::new(CacheTier::Elements, config.limits(CacheTier::Elements)),
            counters: Mutex::new(CacheCounters::default()),
            config,
        }
    }

    pub fn get_markdown(&self, html: &str) -> Option<Arc<String>> {
        self.lookup(&self.markdown, html)
    }

    /// Markdown lookup that neither counts as a hit/miss nor refreshes recency.
    pub fn peek_markdown(&self, html: &str) -> Option<Arc<String>> {
        self.markdown.peek(&ContentHash::of(html))
    }

    pub fn set_markdown(&self, html: &str, markdown: Arc<String>) {
        self.store(&self.markdown, html, markdown);
    }

    pub fn get_document(&self, html: &str) -> Option<Arc<StyledDocument>> {
        self.lookup(&self.documents, html)
    }

    pub fn set_document(&self, html: &str, document: Arc<StyledDocument>) {
        self.store(&self.documents, html, document);
    }

    pub fn get_elements(&self, html: &str) -> Option<Arc<Vec<ContentElement>>> {
        self.lookup(&self.elements, html)
    }

    pub fn set_elements(&self, html: &str, elements: Arc<Vec<ContentElement>>) {
        self.store(&self.elements, html, elements);
    }

    /// Drop every entry of `tier`. Statistics are kept.
    pub fn clear(&self, tier: CacheTier) {
        match tier {
            CacheTier::Markdown => self.markdown.clear(),
            CacheTier::Document => self.documents.clear(),
            CacheTier::Elements => self.elements.clear(),
        }
        debug!(tier = tier.as_str(), "Cleared cache tier");
    }

    /// Drop every entry of every tier and reset statistics.
    pub fn clear_all(&self) {
        for tier in CacheTier::ALL {
            self.clear(tier);
        }
        *mutex_lock(&self.counters, SOURCE, "clear_all") = CacheCounters::default();
    }

    pub fn statistics(&self) -> CacheStatistics {
        let counters = mutex_lock(&self.counters, SOURCE, "statistics");
        let tiers = CacheTier::ALL
            .into_iter()
            .map(|tier| {
                let TierCounters { hits, misses } = counters.tier(tier);
                let (entries, cost, cost_limit) = match tier {
                    CacheTier::Markdown => occupancy(&self.markdown),
                    CacheTier::Document => occupancy(&self.documents),
                    CacheTier::Elements => occupancy(&self.elements),
                };
                TierStatistics {
                    tier,
                    hits,
                    misses,
                    entries,
                    cost,
                    cost_limit,
                }
            })
            .collect();
        CacheStatistics { tiers }
    }

    /// React to a low-memory signal from the host.
    ///
    /// The Markdown tier is cleared right away. The document tier follows
    /// after the configured escalation delay, on the current Tokio runtime
    /// (or immediately when called outside one). The element tier is left
    /// alone.
    pub fn on_memory_pressure(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        info!(
            escalation_ms = self.config.pressure_escalation_ms,
            "Memory pressure signalled; clearing markdown tier"
        );
        self.clear(CacheTier::Markdown);

        let Ok(runtime) = Handle::try_current() else {
            self.clear(CacheTier::Document);
            return None;
        };

        let cache = Arc::downgrade(self);
        let delay = self.config.pressure_escalation();
        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(cache) = cache.upgrade() {
                info!("Memory pressure persisted; clearing document tier");
                cache.clear(CacheTier::Document);
            }
        }))
    }

    fn lookup<V: CacheCost>(&self, store: &TierStore<V>, content: &str) -> Option<Arc<V>> {
        let found = store.get(&ContentHash::of(content));
        let tier = store.tier();
        let hit = found.is_some();

        mutex_lock(&self.counters, SOURCE, "lookup").record(tier, hit);
        let metric = if hit { METRIC_HIT } else { METRIC_MISS };
        counter!(metric, "tier" => tier.as_str()).increment(1);
        found
    }

    fn store<V: CacheCost>(&self, store: &TierStore<V>, content: &str, value: Arc<V>) {
        let stored = store.insert(ContentHash::of(content), value);
        debug!(tier = store.tier().as_str(), stored, "Cache store");
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn occupancy<V: CacheCost>(store: &TierStore<V>) -> (usize, usize, usize) {
    (store.len(), store.total_cost(), store.cost_limit())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn small_cache() -> ContentCache {
        ContentCache::new(CacheConfig {
            markdown_cost_limit: 64,
            pressure_escalation_ms: 20,
            ..Default::default()
        })
    }

    #[test]
    fn hits_and_misses_are_counted_per_tier() {
        let cache = small_cache();
        assert!(cache.get_markdown("<p>a</p>").is_none());
        cache.set_markdown("<p>a</p>", Arc::new("a".to_string()));
        assert_eq!(cache.get_markdown("<p>a</p>").as_deref().map(String::as_str), Some("a"));

        let stats = cache.statistics();
        let markdown = stats.tier(CacheTier::Markdown).expect("markdown tier");
        assert_eq!((markdown.hits, markdown.misses), (1, 1));
        assert_eq!(markdown.entries, 1);
        assert_eq!(stats.tier(CacheTier::Elements).map(|t| t.lookups()), Some(0));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn peek_does_not_touch_statistics() {
        let cache = small_cache();
        cache.set_markdown("x", Arc::new("y".to_string()));
        assert!(cache.peek_markdown("x").is_some());
        assert_eq!(cache.statistics().total_hits(), 0);
    }

    #[test]
    fn tier_cost_never_exceeds_its_limit() {
        let cache = small_cache();
        for index in 0..20 {
            cache.set_markdown(&format!("html {index}"), Arc::new("0123456789".to_string()));
            let stats = cache.statistics();
            let markdown = stats.tier(CacheTier::Markdown).expect("markdown tier");
            assert!(markdown.cost <= markdown.cost_limit);
        }
    }

    #[test]
    fn clear_keeps_statistics_but_clear_all_resets_them() {
        let cache = small_cache();
        cache.set_markdown("x", Arc::new("y".to_string()));
        cache.get_markdown("x");

        cache.clear(CacheTier::Markdown);
        assert!(cache.peek_markdown("x").is_none());
        assert_eq!(cache.statistics().total_hits(), 1);

        cache.clear_all();
        assert_eq!(cache.statistics().total_hits(), 0);
        assert_eq!(cache.statistics().total_misses(), 0);
    }

    #[test]
    fn memory_pressure_without_runtime_clears_both_tiers_at_once() {
        let cache = Arc::new(small_cache());
        cache.set_markdown("m", Arc::new("m".to_string()));
        cache.set_document("m", Arc::new(StyledDocument::new()));
        cache.set_elements("m", Arc::new(vec![ContentElement::heading("h", 1)]));

        assert!(cache.on_memory_pressure().is_none());

        let stats = cache.statistics();
        assert_eq!(stats.tier(CacheTier::Markdown).map(|t| t.entries), Some(0));
        assert_eq!(stats.tier(CacheTier::Document).map(|t| t.entries), Some(0));
        assert_eq!(stats.tier(CacheTier::Elements).map(|t| t.entries), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn memory_pressure_escalates_to_documents_after_delay() {
        let cache = Arc::new(small_cache());
        cache.set_markdown("m", Arc::new("m".to_string()));
        cache.set_document("m", Arc::new(StyledDocument::new()));
        cache.set_elements("m", Arc::new(vec![ContentElement::heading("h", 1)]));

        let escalation = cache.on_memory_pressure().expect("escalation task");
        assert!(cache.peek_markdown("m").is_none());
        assert_eq!(
            cache.statistics().tier(CacheTier::Document).map(|t| t.entries),
            Some(1)
        );

        tokio::time::advance(Duration::from_millis(25)).await;
        escalation.await.expect("escalation completes");

        let stats = cache.statistics();
        assert_eq!(stats.tier(CacheTier::Document).map(|t| t.entries), Some(0));
        assert_eq!(stats.tier(CacheTier::Elements).map(|t| t.entries), Some(1));
    }
}
