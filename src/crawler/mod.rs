//! Crawler module for paginated listing harvests
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and fetching with a fixed backoff schedule
//! - Record and pagination extraction from listing pages
//! - Pagination discovery from the seed page
//! - Admission control under the concurrency cap
//! - Overall crawl coordination

mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod scheduler;
mod transport;

pub use coordinator::{Coordinator, PageError};
pub use discovery::{total_pages_from_href, DiscoveryError, PaginationDiscoverer};
pub use fetcher::{FetchError, RetryPolicy, RetryState, RetryingFetcher, SUCCESS_STATUS};
pub use parser::{HtmlPageParser, PageParser, ParseError};
pub use scheduler::{Admission, AdmissionError, AdmissionGate};
pub use transport::{
    build_http_client, HttpTransport, Transport, TransportError, TransportResponse,
};

use crate::config::Config;
use crate::output::{CrawlReport, RecordSink};
use crate::HarvestError;
use std::sync::Arc;

/// Runs a complete crawl with the HTTP transport
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and page parser
/// 2. Discover the number of pages from the seed page
/// 3. Fetch every page under the concurrency cap
/// 4. Stream every page's records into `sink`
/// 5. Close the sink and report
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; check `report.phase` for its outcome
/// * `Err(HarvestError)` - The crawler could not be built from `config`;
///   `sink` has been finished
pub async fn crawl(config: &Config, sink: Arc<dyn RecordSink>) -> Result<CrawlReport, HarvestError> {
    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            if let Err(sink_error) = sink.finish() {
                tracing::error!("Failed to close sink: {}", sink_error);
            }
            return Err(e);
        }
    };
    Ok(coordinator.run(sink).await)
}
