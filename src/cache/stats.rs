//! Hit/miss accounting and point-in-time statistics snapshots.

use serde::Serialize;

use super::keys::CacheTier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounters {
    pub hits: u64,
    pub misses: u64,
}

/// Counters for every tier. Lives behind the single statistics mutex of the
/// owning cache.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    markdown: TierCounters,
    document: TierCounters,
    elements: TierCounters,
}

impl CacheCounters {
    pub fn record(&mut self, tier: CacheTier, hit: bool) {
        let counters = self.tier_mut(tier);
        if hit {
            counters.hits += 1;
        } else {
            counters.misses += 1;
        }
    }

    pub fn tier(&self, tier: CacheTier) -> TierCounters {
        match tier {
            CacheTier::Markdown => self.markdown,
            CacheTier::Document => self.document,
            CacheTier::Elements => self.elements,
        }
    }

    fn tier_mut(&mut self, tier: CacheTier) -> &mut TierCounters {
        match tier {
            CacheTier::Markdown => &mut self.markdown,
            CacheTier::Document => &mut self.document,
            CacheTier::Elements => &mut self.elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStatistics {
    pub tier: CacheTier,
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub cost: usize,
    pub cost_limit: usize,
}

impl TierStatistics {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, in `[0, 1]`. Zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.lookups())
    }
}

/// Snapshot returned by `ContentCache::statistics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub tiers: Vec<TierStatistics>,
}

impl CacheStatistics {
    pub fn tier(&self, tier: CacheTier) -> Option<&TierStatistics> {
        self.tiers.iter().find(|stats| stats.tier == tier)
    }

    pub fn total_hits(&self) -> u64 {
        self.tiers.iter().map(|stats| stats.hits).sum()
    }

    pub fn total_misses(&self) -> u64 {
        self.tiers.iter().map(|stats| stats.misses).sum()
    }

    pub fn total_cost(&self) -> usize {
        self.tiers.iter().map(|stats| stats.cost).sum()
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.total_hits();
        ratio(hits, hits + self.total_misses())
    }
}

fn ratio(hits: u64, lookups: u64) -> f64 {
    if lookups == 0 {
        0.0
    } else {
        hits as f64 / lookups as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_tier() {
        let mut counters = CacheCounters::default();
        counters.record(CacheTier::Markdown, true);
        counters.record(CacheTier::Markdown, false);
        counters.record(CacheTier::Elements, false);

        assert_eq!(counters.tier(CacheTier::Markdown), TierCounters { hits: 1, misses: 1 });
        assert_eq!(counters.tier(CacheTier::Document), TierCounters::default());
        assert_eq!(counters.tier(CacheTier::Elements).misses, 1);
    }

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        let stats = CacheStatistics { tiers: Vec::new() };
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
