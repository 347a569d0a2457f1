//! Result aggregation
//!
//! Merges every page's records into the sink and keeps the crawl-wide
//! record total.

use crate::output::traits::{RecordSink, SinkResult};
use crate::record::Record;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared by all page tasks of one crawl
///
/// The total only grows after the sink accepted a batch, so it always equals
/// the number of records actually written. A failed append leaves the total
/// untouched and returns the error to the page task.
pub struct Aggregator {
    sink: Arc<dyn RecordSink>,
    total: AtomicU64,
    finished: AtomicBool,
}

impl Aggregator {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            sink,
            total: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Writes one page's records and adds them to the total
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records written for the page
    /// * `Err(SinkError)` - The sink rejected the batch; nothing was counted
    pub fn record(&self, page: u32, records: &[Record]) -> SinkResult<usize> {
        if records.is_empty() {
            tracing::debug!(page, "page had no records");
            return Ok(0);
        }

        self.sink.append(records)?;
        let total = self
            .total
            .fetch_add(records.len() as u64, Ordering::AcqRel)
            + records.len() as u64;

        tracing::debug!(page, records = records.len(), total, "page records aggregated");
        Ok(records.len())
    }

    /// Records written so far
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Closes the sink; only the first call reaches it
    pub fn finish(&self) -> SinkResult<()> {
        if self.finished.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.sink.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::memory::MemorySink;
    use crate::output::traits::SinkError;

    fn page_records(page: u32, count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::new(
                    format!("actor-{}-{}", page, i),
                    "VN",
                    format!("http://site-{}-{}.vn", page, i),
                    "10.0.0.1",
                    "2024-01-01",
                )
            })
            .collect()
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn append(&self, _records: &[Record]) -> SinkResult<()> {
            Err(SinkError::Write("disk full".to_string()))
        }

        fn finish(&self) -> SinkResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_record_counts_written_records() {
        let sink = Arc::new(MemorySink::new());
        let aggregator = Aggregator::new(sink.clone());

        assert_eq!(aggregator.record(1, &page_records(1, 3)).unwrap(), 3);
        assert_eq!(aggregator.record(2, &[]).unwrap(), 0);
        assert_eq!(aggregator.total(), 3);
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.batch_count(), 1);
    }

    #[test]
    fn test_failed_append_is_not_counted() {
        let aggregator = Aggregator::new(Arc::new(FailingSink));

        assert!(aggregator.record(1, &page_records(1, 5)).is_err());
        assert_eq!(aggregator.total(), 0);
    }

    #[test]
    fn test_finish_reaches_sink_once() {
        let sink = Arc::new(MemorySink::new());
        let aggregator = Aggregator::new(sink.clone());

        aggregator.finish().unwrap();
        aggregator.finish().unwrap();
        assert_eq!(sink.finish_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pages_sum_without_lost_updates() {
        const PAGES: u32 = 64;
        const PER_PAGE: usize = 25;

        for _ in 0..20 {
            let sink = Arc::new(MemorySink::new());
            let aggregator = Arc::new(Aggregator::new(sink.clone()));

            let mut tasks = tokio::task::JoinSet::new();
            for page in 1..=PAGES {
                let aggregator = Arc::clone(&aggregator);
                tasks.spawn(async move {
                    tokio::task::yield_now().await;
                    aggregator.record(page, &page_records(page, PER_PAGE)).unwrap();
                });
            }
            while let Some(joined) = tasks.join_next().await {
                joined.unwrap();
            }

            assert_eq!(aggregator.total(), PAGES as u64 * PER_PAGE as u64);
            assert_eq!(sink.records().len(), PAGES as usize * PER_PAGE);
            assert_eq!(sink.batch_count(), PAGES as usize);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batches_are_not_interleaved() {
        let sink = Arc::new(MemorySink::new());
        let aggregator = Arc::new(Aggregator::new(sink.clone()));

        let mut tasks = tokio::task::JoinSet::new();
        for page in 1..=16u32 {
            let aggregator = Arc::clone(&aggregator);
            tasks.spawn(async move {
                aggregator.record(page, &page_records(page, 50)).unwrap();
            });
        }
        while tasks.join_next().await.is_some() {}

        // Every page's rows must appear as one contiguous run
        let records = sink.records();
        for chunk in records.chunks(50) {
            let prefix = chunk[0].actor.rsplit_once('-').unwrap().0.to_string();
            assert!(chunk.iter().all(|r| r.actor.starts_with(&format!("{}-", prefix))));
        }
    }
}
