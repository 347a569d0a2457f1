//! Record sink trait and errors
//!
//! This module defines the interface the aggregator writes through.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink is already closed")]
    Closed,

    #[error("Sink lock poisoned by a panicking writer")]
    Poisoned,

    #[error("Failed to write output: {0}")]
    Write(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Append-only destination for extracted records
///
/// Implementations must be thread-safe: `append` may be called from many
/// page tasks at once, and one call's batch must never interleave with
/// another's.
pub trait RecordSink: Send + Sync {
    /// Appends one page's records as a single batch
    ///
    /// # Arguments
    ///
    /// * `records` - The records to write, in page order
    fn append(&self, records: &[Record]) -> SinkResult<()>;

    /// Flushes and closes the sink
    ///
    /// Called exactly once per crawl by the aggregator, on every exit path.
    fn finish(&self) -> SinkResult<()>;
}
