//! Pagination discovery
//!
//! Fetches the seed page once and reads the total page count from its
//! "last page" link, e.g. `/search/country/VN/pages/317` → `317`.

use crate::crawler::fetcher::{FetchError, RetryingFetcher};
use crate::crawler::parser::PageParser;
use crate::url::{last_path_segment, parse_page_number};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Reasons the total page count could not be determined
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("seed page could not be fetched: {0}")]
    Fetch(#[from] FetchError),

    #[error("no last-page link found on {url}")]
    MissingPagination { url: String },

    #[error("last-page link '{href}' has no page number: {reason}")]
    InvalidPageNumber { href: String, reason: String },
}

/// Determines how many pages the listing has
pub struct PaginationDiscoverer {
    fetcher: Arc<RetryingFetcher>,
    parser: Arc<dyn PageParser>,
    seed_url: Url,
}

impl PaginationDiscoverer {
    pub fn new(fetcher: Arc<RetryingFetcher>, parser: Arc<dyn PageParser>, seed_url: Url) -> Self {
        Self {
            fetcher,
            parser,
            seed_url,
        }
    }

    /// Fetches the seed page and returns the total page count (always >= 1)
    pub async fn discover(&self, cancel: &CancellationToken) -> Result<u32, DiscoveryError> {
        tracing::info!("Discovering page count from {}", self.seed_url);

        let document = self.fetcher.fetch(self.seed_url.as_str(), cancel).await?;

        let href = self
            .parser
            .last_page_href(&document)
            .ok_or_else(|| DiscoveryError::MissingPagination {
                url: self.seed_url.to_string(),
            })?;

        let total = total_pages_from_href(&self.seed_url, &href)?;
        tracing::info!(total_pages = total, href = %href, "Pagination discovered");
        Ok(total)
    }
}

/// Extracts the page count from a last-page href relative to `seed`
pub fn total_pages_from_href(seed: &Url, href: &str) -> Result<u32, DiscoveryError> {
    let segment = last_path_segment(seed, href).map_err(|e| DiscoveryError::InvalidPageNumber {
        href: href.to_string(),
        reason: e.to_string(),
    })?;

    parse_page_number(&segment).ok_or_else(|| DiscoveryError::InvalidPageNumber {
        href: href.to_string(),
        reason: format!("'{}' is not a positive integer", segment),
    })
}
