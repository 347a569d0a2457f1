use crate::state::PageOutcome;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-crawl page tallies, shared by every page task
#[derive(Debug, Default)]
pub struct CrawlCounters {
    scheduled: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    skipped: AtomicUsize,
}

/// Point-in-time copy of [`CrawlCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub scheduled: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub skipped: usize,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a page index that was admitted and launched
    pub fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts the terminal outcome of one page
    pub fn record_outcome(&self, outcome: PageOutcome) {
        let counter = match outcome {
            PageOutcome::Succeeded { .. } => &self.succeeded,
            PageOutcome::Failed => &self.failed,
            PageOutcome::Cancelled => &self.cancelled,
            PageOutcome::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Pages that reached a terminal outcome after being launched
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}
