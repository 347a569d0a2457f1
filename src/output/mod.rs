//! Output module for persisting records and reporting on a crawl
//!
//! This module handles:
//! - Aggregating page results into a sink under concurrency
//! - Writing records to CSV (or memory)
//! - Printing and exporting the final crawl summary

mod aggregator;
mod csv_sink;
mod memory;
mod summary;
mod traits;

pub use aggregator::Aggregator;
pub use csv_sink::CsvSink;
pub use memory::MemorySink;
pub use summary::{format_markdown_summary, print_summary, write_markdown_summary, CrawlReport};
pub use traits::{RecordSink, SinkError, SinkResult};
