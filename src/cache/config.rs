//! Cache configuration.
//!
//! Each tier has its own byte-cost ceiling and entry-count ceiling. The
//! Markdown and element tiers default to the same size; the styled-document
//! tier is larger.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use super::keys::CacheTier;

const MIB: usize = 1024 * 1024;

const DEFAULT_MARKDOWN_COST_LIMIT: usize = 16 * MIB;
const DEFAULT_MARKDOWN_COUNT_LIMIT: usize = 200;
const DEFAULT_DOCUMENT_COST_LIMIT: usize = 32 * MIB;
const DEFAULT_DOCUMENT_COUNT_LIMIT: usize = 400;
const DEFAULT_ELEMENT_COST_LIMIT: usize = 16 * MIB;
const DEFAULT_ELEMENT_COUNT_LIMIT: usize = 200;
const DEFAULT_PRESSURE_ESCALATION_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum summed cost of Markdown entries (bytes).
    pub markdown_cost_limit: usize,
    pub markdown_count_limit: usize,
    /// Maximum summed cost of styled-document entries.
    pub document_cost_limit: usize,
    pub document_count_limit: usize,
    /// Maximum summed cost of element-list entries.
    pub element_cost_limit: usize,
    pub element_count_limit: usize,
    /// Delay between clearing the Markdown tier and the document tier when
    /// memory pressure is signalled.
    pub pressure_escalation_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            markdown_cost_limit: DEFAULT_MARKDOWN_COST_LIMIT,
            markdown_count_limit: DEFAULT_MARKDOWN_COUNT_LIMIT,
            document_cost_limit: DEFAULT_DOCUMENT_COST_LIMIT,
            document_count_limit: DEFAULT_DOCUMENT_COUNT_LIMIT,
            element_cost_limit: DEFAULT_ELEMENT_COST_LIMIT,
            element_count_limit: DEFAULT_ELEMENT_COUNT_LIMIT,
            pressure_escalation_ms: DEFAULT_PRESSURE_ESCALATION_MS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            markdown_cost_limit: settings.markdown_cost_limit,
            markdown_count_limit: settings.markdown_count_limit,
            document_cost_limit: settings.document_cost_limit,
            document_count_limit: settings.document_count_limit,
            element_cost_limit: settings.element_cost_limit,
            element_count_limit: settings.element_count_limit,
            pressure_escalation_ms: settings.pressure_escalation_ms,
        }
    }
}

/// Resolved limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub cost_limit: usize,
    pub count_limit: NonZeroUsize,
}

impl CacheConfig {
    /// Limits for `tier`. A zero count limit is clamped to 1.
    pub fn limits(&self, tier: CacheTier) -> TierLimits {
        let (cost_limit, count_limit) = match tier {
            CacheTier::Markdown => (self.markdown_cost_limit, self.markdown_count_limit),
            CacheTier::Document => (self.document_cost_limit, self.document_count_limit),
            CacheTier::Elements => (self.element_cost_limit, self.element_count_limit),
        };
        TierLimits {
            cost_limit,
            count_limit: NonZeroUsize::new(count_limit).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn pressure_escalation(&self) -> Duration {
        Duration::from_millis(self.pressure_escalation_ms)
    }
}
