use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::record::Record;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// [`RecordSink`] that keeps every record in memory
///
/// Used for dry runs and tests. Batches are appended atomically.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
    batches: AtomicUsize,
    finish_calls: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record appended so far, in append order
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of non-empty batches appended
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::Acquire)
    }

    /// Number of times `finish` was called
    pub fn finish_count(&self) -> usize {
        self.finish_calls.load(Ordering::Acquire)
    }
}

impl RecordSink for MemorySink {
    fn append(&self, records: &[Record]) -> SinkResult<()> {
        let mut guard = self.records.lock().map_err(|_| SinkError::Poisoned)?;
        guard.extend_from_slice(records);
        self.batches.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn finish(&self) -> SinkResult<()> {
        self.finish_calls.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
