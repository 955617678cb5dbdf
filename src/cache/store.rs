//! Cost-bounded LRU stores backing each cache tier.
//!
//! A tier is bounded twice: by entry count (enforced by the LRU itself) and
//! by the summed cost of its entries (enforced here by popping the least
//! recently used entries until the total fits again).

use std::sync::{Arc, Mutex};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::domain::{ContentElement, StyledDocument};

use super::config::TierLimits;
use super::keys::{CacheTier, ContentHash};
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";
const METRIC_EVICT: &str = "forumdown_cache_evict_total";

/// Cost charged per element of a cached element list.
pub const ELEMENT_COST: usize = 1000;
/// Cost charged per character of a cached styled document.
pub const DOCUMENT_CHAR_COST: usize = 2;

/// Size estimate used to bound a tier.
pub trait CacheCost {
    fn cache_cost(&self) -> usize;
}

impl CacheCost for String {
    fn cache_cost(&self) -> usize {
        self.len()
    }
}

impl CacheCost for Vec<ContentElement> {
    fn cache_cost(&self) -> usize {
        self.len().saturating_mul(ELEMENT_COST)
    }
}

impl CacheCost for StyledDocument {
    fn cache_cost(&self) -> usize {
        self.char_count().saturating_mul(DOCUMENT_CHAR_COST)
    }
}

struct Entry<V> {
    value: Arc<V>,
    cost: usize,
}

struct TierState<V> {
    entries: LruCache<ContentHash, Entry<V>>,
    total_cost: usize,
}

/// One cache tier. Values are shared out as `Arc`s and never mutated in place.
pub struct TierStore<V> {
    tier: CacheTier,
    cost_limit: usize,
    state: Mutex<TierState<V>>,
}

impl<V: CacheCost> TierStore<V> {
    pub fn new(tier: CacheTier, limits: TierLimits) -> Self {
        Self {
            tier,
            cost_limit: limits.cost_limit,
            state: Mutex::new(TierState {
                entries: LruCache::new(limits.count_limit),
                total_cost: 0,
            }),
        }
    }

    pub fn tier(&self) -> CacheTier {
        self.tier
    }

    pub fn cost_limit(&self) -> usize {
        self.cost_limit
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &ContentHash) -> Option<Arc<V>> {
        mutex_lock(&self.state, SOURCE, "get")
            .entries
            .get(key)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Look up `key` without touching recency.
    pub fn peek(&self, key: &ContentHash) -> Option<Arc<V>> {
        mutex_lock(&self.state, SOURCE, "peek")
            .entries
            .peek(key)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Store `value` under `key`, evicting least recently used entries while
    /// the tier is over its cost limit. Returns `false` when the value alone
    /// exceeds the limit and was not stored.
    pub fn insert(&self, key: ContentHash, value: Arc<V>) -> bool {
        let cost = value.cache_cost();
        let mut state = mutex_lock(&self.state, SOURCE, "insert");

        if let Some(previous) = state.entries.pop(&key) {
            state.total_cost = state.total_cost.saturating_sub(previous.cost);
        }

        if cost > self.cost_limit {
            debug!(
                tier = self.tier.as_str(),
                cost,
                cost_limit = self.cost_limit,
                "Entry exceeds tier cost limit; not cached"
            );
            return false;
        }

        let mut evicted: u64 = 0;
        if let Some((_, displaced)) = state.entries.push(key, Entry { value, cost }) {
            state.total_cost = state.total_cost.saturating_sub(displaced.cost);
            evicted += 1;
        }
        state.total_cost += cost;

        while state.total_cost > self.cost_limit {
            let Some((_, victim)) = state.entries.pop_lru() else {
                break;
            };
            state.total_cost = state.total_cost.saturating_sub(victim.cost);
            evicted += 1;
        }

        if evicted > 0 {
            counter!(METRIC_EVICT, "tier" => self.tier.as_str()).increment(evicted);
        }
        true
    }

    pub fn clear(&self) {
        let mut state = mutex_lock(&self.state, SOURCE, "clear");
        state.entries.clear();
        state.total_cost = 0;
    }

    pub(crate) fn len(&self) -> usize {
        mutex_lock(&self.state, SOURCE, "len").entries.len()
    }

    pub fn total_cost(&self) -> usize {
        mutex_lock(&self.state, SOURCE, "total_cost").total_cost
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    fn store(cost_limit: usize, count_limit: usize) -> TierStore<String> {
        TierStore::new(
            CacheTier::Markdown,
            TierLimits {
                cost_limit,
                count_limit: NonZeroUsize::new(count_limit).expect("non-zero"),
            },
        )
    }

    fn put(store: &TierStore<String>, content: &str, value: &str) -> bool {
        store.insert(ContentHash::of(content), Arc::new(value.to_string()))
    }

    #[test]
    fn cost_limit_evicts_least_recently_used() {
        let store = store(10, 100);
        assert!(put(&store, "a", "aaaa"));
        assert!(put(&store, "b", "bbbb"));
        store.get(&ContentHash::of("a"));
        assert!(put(&store, "c", "cccc"));

        assert!(store.total_cost() <= 10);
        assert!(store.peek(&ContentHash::of("a")).is_some());
        assert!(store.peek(&ContentHash::of("b")).is_none());
        assert!(store.peek(&ContentHash::of("c")).is_some());
    }

    #[test]
    fn count_limit_is_enforced() {
        let store = store(1_000, 2);
        put(&store, "a", "1");
        put(&store, "b", "2");
        put(&store, "c", "3");

        assert_eq!(store.len(), 2);
        assert_eq!(store.total_cost(), 2);
    }

    #[test]
    fn oversized_values_are_rejected() {
        let store = store(4, 10);
        put(&store, "small", "ok");
        assert!(!put(&store, "big", "far too large"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.total_cost(), 2);
    }

    #[test]
    fn replacing_a_key_recomputes_cost() {
        let store = store(100, 10);
        put(&store, "a", "short");
        put(&store, "a", "a bit longer");

        assert_eq!(store.len(), 1);
        assert_eq!(store.total_cost(), "a bit longer".len());
    }

    #[test]
    fn element_and_document_costs_use_fixed_weights() {
        let elements = vec![
            ContentElement::heading("one", 1),
            ContentElement::heading("two", 2),
        ];
        assert_eq!(elements.cache_cost(), 2 * ELEMENT_COST);

        let mut document = StyledDocument::new();
        document.push("héllo", &crate::domain::Stylesheet::default().body_style());
        assert_eq!(document.cache_cost(), 5 * DOCUMENT_CHAR_COST);
    }
}
