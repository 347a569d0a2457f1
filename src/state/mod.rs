//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The orchestrator's phase (idle, discovering, scheduling, draining, done, aborted)
//! - `PageOutcome`: The terminal outcome of a single page index
//! - `CrawlCounters`: Lock-free per-crawl tallies shared by all page tasks

mod counters;
mod crawl_phase;
mod page_outcome;

// Re-export main types
pub use counters::{CounterSnapshot, CrawlCounters};
pub use crawl_phase::CrawlPhase;
pub use page_outcome::PageOutcome;
