//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one crawl through its phases:
//! - Discovering the total page count from the seed page
//! - Admitting one task per page index under the concurrency cap
//! - Fetching and parsing each page, tolerating or escalating failures
//! - Draining launched tasks and keeping the first fatal error
//! - Closing the sink and producing the final report

use crate::config::{Config, PageFailurePolicy};
use crate::crawler::discovery::{DiscoveryError, PaginationDiscoverer};
use crate::crawler::fetcher::{FetchError, RetryPolicy, RetryingFetcher};
use crate::crawler::parser::{HtmlPageParser, PageParser, ParseError};
use crate::crawler::scheduler::{Admission, AdmissionGate};
use crate::crawler::transport::{build_http_client, HttpTransport, Transport};
use crate::output::{Aggregator, CrawlReport, RecordSink};
use crate::record::Record;
use crate::state::{CrawlCounters, CrawlPhase, PageOutcome};
use crate::url::{page_url, parse_http_url};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a single page produced no records
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unparseable content: {0}")]
    Parse(#[from] ParseError),
}

type TaskResult = Result<PageOutcome, HarvestError>;

/// Main crawl orchestrator
///
/// A coordinator can run several crawls; each run gets its own child
/// cancellation token, counters and aggregator, so nothing carries over
/// between runs. Cancelling the coordinator's token cancels every run.
pub struct Coordinator {
    fetcher: Arc<RetryingFetcher>,
    parser: Arc<dyn PageParser>,
    discoverer: PaginationDiscoverer,
    page_url_template: String,
    max_concurrency: usize,
    page_failure: PageFailurePolicy,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator talking HTTP with the configured client
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The client, selectors or seed URL are invalid
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let parser = HtmlPageParser::new(&config.selectors)?;
        Self::from_parts(
            config,
            Arc::new(HttpTransport::new(client)),
            Arc::new(parser),
        )
    }

    /// Creates a coordinator with an explicit transport and page parser
    pub fn from_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn PageParser>,
    ) -> Result<Self, HarvestError> {
        let seed_url = parse_http_url(&config.source.seed_url)?;
        let fetcher = Arc::new(RetryingFetcher::new(
            transport,
            RetryPolicy::new(config.crawler.backoff_schedule()),
        ));
        let discoverer =
            PaginationDiscoverer::new(Arc::clone(&fetcher), Arc::clone(&parser), seed_url);

        Ok(Self {
            fetcher,
            parser,
            discoverer,
            page_url_template: config.source.page_url_template.clone(),
            max_concurrency: config.crawler.effective_max_concurrency(),
            page_failure: config.crawler.page_failure,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the parent cancellation token (e.g. one wired to Ctrl-C)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs pagination discovery only
    pub async fn discover_total_pages(&self) -> Result<u32, DiscoveryError> {
        self.discoverer.discover(&self.cancel).await
    }

    /// Runs a full crawl: discovery, scheduling, draining
    ///
    /// Always returns a report. A discovery failure ends the crawl in
    /// `Aborted` before any page task starts; the sink is closed on every
    /// path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deface_harvest::config::load_config;
    /// use deface_harvest::crawler::Coordinator;
    /// use deface_harvest::output::{CsvSink, print_summary};
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("harvest.toml"))?;
    /// let sink = Arc::new(CsvSink::create(Path::new(&config.output.csv_path))?);
    /// let report = Coordinator::new(&config)?.run(sink).await;
    /// print_summary(&report);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, sink: Arc<dyn RecordSink>) -> CrawlReport {
        let mut run = CrawlRun::new(sink, self.cancel.child_token());
        let outcome = self.run_phases(&mut run, None).await;
        run.conclude(outcome, self.max_concurrency)
    }

    /// Crawls pages `1..=total_pages` without running discovery
    ///
    /// Exactly `total_pages` indices are considered; zero schedules nothing.
    pub async fn crawl_pages(&self, total_pages: u32, sink: Arc<dyn RecordSink>) -> CrawlReport {
        let mut run = CrawlRun::new(sink, self.cancel.child_token());
        let outcome = self.run_phases(&mut run, Some(total_pages)).await;
        run.conclude(outcome, self.max_concurrency)
    }

    async fn run_phases(
        &self,
        run: &mut CrawlRun,
        known_total: Option<u32>,
    ) -> Result<(), HarvestError> {
        run.advance(CrawlPhase::Discovering)?;
        let total_pages = match known_total {
            Some(total) => total,
            None => self.discoverer.discover(&run.cancel).await?,
        };
        run.total_pages = Some(total_pages);

        run.advance(CrawlPhase::Scheduling)?;
        tracing::info!(
            total_pages,
            max_concurrency = self.max_concurrency,
            "Scheduling page tasks"
        );
        let gate = AdmissionGate::new(self.max_concurrency, run.cancel.clone());
        let mut tasks = JoinSet::new();
        self.schedule(run, &gate, &mut tasks, total_pages).await;

        run.advance(CrawlPhase::Draining)?;
        tracing::debug!(remaining = tasks.len(), "All page indices issued, draining");
        while let Some(joined) = tasks.join_next().await {
            run.absorb(joined);
        }
        run.peak_concurrency = gate.peak_in_flight();

        Ok(())
    }

    /// Admits and launches one task per page index
    ///
    /// Stops at the first failed admission; that index and every later one
    /// is counted as skipped.
    async fn schedule(
        &self,
        run: &mut CrawlRun,
        gate: &AdmissionGate,
        tasks: &mut JoinSet<TaskResult>,
        total_pages: u32,
    ) {
        for page in 1..=total_pages {
            let admission = match gate.admit().await {
                Ok(admission) => admission,
                Err(e) => {
                    let remaining = (total_pages - page + 1) as usize;
                    tracing::warn!(
                        page,
                        remaining,
                        "Admission failed ({}), abandoning remaining pages",
                        e
                    );
                    for _ in page..=total_pages {
                        run.counters.record_outcome(PageOutcome::Skipped);
                    }
                    break;
                }
            };

            run.counters.record_scheduled();
            let slot = TaskSlot {
                cancel_on_unwind: run.cancel.clone().drop_guard(),
                _admission: admission,
            };
            let task = PageTask {
                page,
                url: page_url(&self.page_url_template, page),
                fetcher: Arc::clone(&self.fetcher),
                parser: Arc::clone(&self.parser),
                aggregator: Arc::clone(&run.aggregator),
                counters: Arc::clone(&run.counters),
                cancel: run.cancel.clone(),
                policy: self.page_failure,
            };

            tasks.spawn(async move {
                let result = task.run().await;
                slot.release();
                result
            });

            // Reap whatever already finished so fatal errors surface early
            while let Some(joined) = tasks.try_join_next() {
                run.absorb(joined);
            }
        }
    }
}

/// Resources held by a running page task
///
/// Fields drop in declaration order: a task that unwinds cancels the crawl
/// before its permit is released, so no further page can be admitted.
struct TaskSlot {
    cancel_on_unwind: DropGuard,
    _admission: Admission,
}

impl TaskSlot {
    /// Releases the slot after the task returned normally
    fn release(self) {
        let TaskSlot {
            cancel_on_unwind,
            _admission,
        } = self;
        cancel_on_unwind.disarm();
    }
}

/// Ephemeral state of one crawl
struct CrawlRun {
    phase: CrawlPhase,
    total_pages: Option<u32>,
    counters: Arc<CrawlCounters>,
    aggregator: Arc<Aggregator>,
    cancel: CancellationToken,
    peak_concurrency: usize,
    started_at: DateTime<Utc>,
    fatal: Option<HarvestError>,
    /// Page tasks joined so far, in join order
    joined_tasks: usize,
}

impl CrawlRun {
    fn new(sink: Arc<dyn RecordSink>, cancel: CancellationToken) -> Self {
        Self {
            phase: CrawlPhase::Idle,
            total_pages: None,
            counters: Arc::new(CrawlCounters::new()),
            aggregator: Arc::new(Aggregator::new(sink)),
            cancel,
            peak_concurrency: 0,
            started_at: Utc::now(),
            fatal: None,
            joined_tasks: 0,
        }
    }

    fn advance(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "Crawl phase transition");
        self.phase = next;
        Ok(())
    }

    /// Keeps the first fatal error and cancels the crawl
    fn record_fatal(&mut self, error: HarvestError) {
        self.cancel.cancel();
        if self.fatal.is_none() {
            tracing::error!("Fatal error, cancelling crawl: {}", error);
            self.fatal = Some(error);
        } else {
            tracing::debug!("Additional error after cancellation: {}", error);
        }
    }

    /// Counts one joined task; true on every tenth
    fn note_joined(&mut self) -> bool {
        self.joined_tasks += 1;
        self.joined_tasks % 10 == 0
    }

    fn absorb(&mut self, joined: Result<TaskResult, JoinError>) {
        let report_progress = self.note_joined();

        match joined {
            Ok(Ok(_)) => {
                if report_progress {
                    tracing::info!(
                        "Progress: {} pages finished, {} records",
                        self.joined_tasks,
                        self.aggregator.total()
                    );
                }
            }
            Ok(Err(e)) => self.record_fatal(e),
            Err(e) => {
                self.counters.record_outcome(PageOutcome::Failed);
                self.record_fatal(HarvestError::TaskJoin(e.to_string()));
            }
        }
    }

    fn conclude(mut self, outcome: Result<(), HarvestError>, max_concurrency: usize) -> CrawlReport {
        if let Err(e) = outcome {
            self.record_fatal(e);
        }

        if let Err(e) = self.aggregator.finish() {
            self.record_fatal(e.into());
        }

        if self.fatal.is_none() && self.cancel.is_cancelled() {
            tracing::warn!("Crawl was cancelled externally");
            self.fatal = Some(HarvestError::Cancelled);
        }

        let terminal = if self.fatal.is_some() {
            CrawlPhase::Aborted
        } else {
            CrawlPhase::Done
        };
        if let Err(e) = self.advance(terminal) {
            tracing::error!("{}", e);
            self.phase = CrawlPhase::Aborted;
        }

        let report = CrawlReport {
            phase: self.phase,
            total_pages: self.total_pages,
            pages: self.counters.snapshot(),
            records: self.aggregator.total(),
            peak_concurrency: self.peak_concurrency,
            max_concurrency,
            started_at: self.started_at,
            finished_at: Utc::now(),
            error: self.fatal.map(|e| e.to_string()),
        };

        tracing::info!(
            "Crawl {}: {} records from {} of {} attempted pages in {:.2}s",
            report.phase,
            report.records,
            report.pages.succeeded,
            report.pages.scheduled,
            report.duration_seconds()
        );

        report
    }
}

/// Fetch + parse + aggregate for one page index
struct PageTask {
    page: u32,
    url: String,
    fetcher: Arc<RetryingFetcher>,
    parser: Arc<dyn PageParser>,
    aggregator: Arc<Aggregator>,
    counters: Arc<CrawlCounters>,
    cancel: CancellationToken,
    policy: PageFailurePolicy,
}

impl PageTask {
    /// Returns `Err` only for conditions fatal to the whole crawl
    async fn run(self) -> TaskResult {
        let outcome = match self.fetch_and_parse().await {
            Ok(records) => match self.aggregator.record(self.page, &records) {
                Ok(written) => PageOutcome::Succeeded { records: written },
                Err(e) => {
                    self.counters.record_outcome(PageOutcome::Failed);
                    self.cancel.cancel();
                    return Err(HarvestError::Sink(e));
                }
            },
            Err(PageError::Fetch(e)) if e.is_cancelled() => PageOutcome::Cancelled,
            Err(e) => match self.policy {
                PageFailurePolicy::Degrade => {
                    tracing::warn!(
                        page = self.page,
                        url = %self.url,
                        "Page failed, continuing without its records: {}",
                        e
                    );
                    PageOutcome::Failed
                }
                PageFailurePolicy::Abort => {
                    self.counters.record_outcome(PageOutcome::Failed);
                    self.cancel.cancel();
                    return Err(HarvestError::Page {
                        page: self.page,
                        source: e,
                    });
                }
            },
        };

        self.counters.record_outcome(outcome);
        tracing::debug!(page = self.page, outcome = %outcome, "Page finished");
        Ok(outcome)
    }

    async fn fetch_and_parse(&self) -> Result<Vec<Record>, PageError> {
        let document = self.fetcher.fetch(&self.url, &self.cancel).await?;
        Ok(self.parser.parse_records(&document)?)
    }
}
