//! Forum HTML rendering: mention scanning, Markdown styling, element parsing,
//! a tiered content cache and a deduplicating render coordinator.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
