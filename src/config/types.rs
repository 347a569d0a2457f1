use serde::Deserialize;
use std::time::Duration;

/// Backoff schedule used when the config does not set one (milliseconds)
pub const DEFAULT_BACKOFF_SCHEDULE_MS: [u64; 5] = [10_000, 15_000, 20_000, 25_000, 30_000];

/// Per-request timeout used when the config does not set one (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for Deface-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// What a page whose retries are exhausted does to the rest of the crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFailurePolicy {
    /// Log the failure and continue; the page contributes zero records
    #[default]
    Degrade,

    /// Cancel the crawl; pages already running still finish
    Abort,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of page tasks in flight (defaults to CPU parallelism)
    #[serde(rename = "max-concurrency", default)]
    pub max_concurrency: Option<u32>,

    /// Waits between attempts; its length is the maximum attempt count
    #[serde(
        rename = "backoff-schedule-ms",
        default = "default_backoff_schedule_ms"
    )]
    pub backoff_schedule_ms: Vec<u64>,

    /// Timeout applied to every HTTP request
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Whether an exhausted page aborts the crawl
    #[serde(rename = "page-failure", default)]
    pub page_failure: PageFailurePolicy,
}

impl CrawlerConfig {
    /// Returns the configured concurrency cap, or the host's parallelism
    pub fn effective_max_concurrency(&self) -> usize {
        match self.max_concurrency {
            Some(n) => n as usize,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// Returns the backoff schedule as durations
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_schedule_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Returns the per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            backoff_schedule_ms: default_backoff_schedule_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            page_failure: PageFailurePolicy::default(),
        }
    }
}

fn default_backoff_schedule_ms() -> Vec<u64> {
    DEFAULT_BACKOFF_SCHEDULE_MS.to_vec()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// The listing being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Page fetched to discover the total page count
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// URL of page N, with `{page}` standing for N
    #[serde(rename = "page-url-template")]
    pub page_url_template: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// CSS selectors used by the HTML page parser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorConfig {
    /// Selects one element per record
    #[serde(rename = "record-rows", default = "default_record_rows")]
    pub record_rows: String,

    /// Selects the cells of a record row
    #[serde(rename = "record-cells", default = "default_record_cells")]
    pub record_cells: String,

    /// Selects the anchor pointing at the last page
    #[serde(rename = "last-page-link", default = "default_last_page_link")]
    pub last_page_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            record_rows: default_record_rows(),
            record_cells: default_record_cells(),
            last_page_link: default_last_page_link(),
        }
    }
}

fn default_record_rows() -> String {
    "table tbody tr".to_string()
}

fn default_record_cells() -> String {
    "td".to_string()
}

fn default_last_page_link() -> String {
    "ul.pagination li:last-child a".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV file receiving every record
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Optional path of a markdown crawl summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}
