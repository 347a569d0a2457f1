//! Retrying fetcher
//!
//! This module issues one logical GET request with bounded retries:
//! - Exactly HTTP 200 counts as success; any other status or a transport
//!   failure fails the attempt
//! - Failed attempts are retried after the next wait in a fixed, escalating
//!   backoff schedule
//! - A pending backoff is cut short when the crawl is cancelled
//! - One tracing event is emitted per attempt
//!
//! # Retry Logic
//!
//! | Attempt | Outcome | Next state |
//! |---------|---------|------------|
//! | n < len(schedule) | failure | BackingOff(schedule[n - 1]) → attempt n + 1 |
//! | n = len(schedule) | failure | Exhausted → last error returned |
//! | any | HTTP 200 | body returned |
//!
//! Whether a failure is fatal to the crawl is decided by the coordinator.

use crate::crawler::transport::{Transport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The only status code accepted as success
pub const SUCCESS_STATUS: u16 = 200;

/// Failure of a single logical fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("unexpected response from {url}: HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("fetch of {url} cancelled during backoff")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true if the fetch stopped because the crawl was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Fixed, ordered backoff schedule
///
/// The number of attempts equals the schedule length (at least one). The
/// wait after failed attempt `n` (1-based) is `schedule[n - 1]`, used only if
/// another attempt remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    schedule: Vec<Duration>,
}

/// Where the fetcher goes after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Waiting before attempt `attempt + 1`
    BackingOff { attempt: usize, delay: Duration },

    /// No attempts remain
    Exhausted { attempts: usize },
}

impl RetryPolicy {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }

    /// Maximum number of attempts per fetch
    pub fn max_attempts(&self) -> usize {
        self.schedule.len().max(1)
    }

    /// Decides the next state after attempt `attempt` (1-based) failed
    ///
    /// Attempt `0` is not a valid attempt number and yields `Exhausted`.
    pub fn after_failure(&self, attempt: usize) -> RetryState {
        let delay = attempt
            .checked_sub(1)
            .and_then(|index| self.schedule.get(index));

        match delay {
            Some(&delay) if attempt < self.max_attempts() => {
                RetryState::BackingOff { attempt, delay }
            }
            _ => RetryState::Exhausted { attempts: attempt },
        }
    }
}

/// Fetches documents through a [`Transport`] with bounded retries
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetches `url`, retrying per the backoff schedule
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The body of the first HTTP 200 response
    /// * `Err(FetchError)` - The last attempt's error once the schedule is
    ///   exhausted, or `Cancelled` if `cancel` fired during a backoff
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let error = match self.attempt(url).await {
                Ok(body) => {
                    tracing::debug!(
                        url,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "fetch succeeded"
                    );
                    return Ok(body);
                }
                Err(e) => e,
            };

            match self.policy.after_failure(attempt) {
                RetryState::BackingOff { delay, .. } => {
                    tracing::warn!(
                        url,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        backoff_ms = delay.as_millis() as u64,
                        error = %error,
                        "fetch attempt failed, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            tracing::debug!(url, attempt, "backoff cut short by cancellation");
                            return Err(FetchError::Cancelled {
                                url: url.to_string(),
                            });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    attempt += 1;
                }
                RetryState::Exhausted { attempts } => {
                    tracing::warn!(
                        url,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %error,
                        "fetch failed, retries exhausted"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Performs a single request
    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if response.status != SUCCESS_STATUS {
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::transport::testing::{FakeTransport, UnreachableTransport};

    const URL: &str = "http://listing.test/pages/1";

    fn schedule() -> Vec<Duration> {
        [10, 15, 20, 25, 30]
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect()
    }

    #[test]
    fn test_retry_policy_states() {
        let policy = RetryPolicy::new(schedule());
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(
            policy.after_failure(1),
            RetryState::BackingOff {
                attempt: 1,
                delay: Duration::from_secs(10)
            }
        );
        assert_eq!(
            policy.after_failure(4),
            RetryState::BackingOff {
                attempt: 4,
                delay: Duration::from_secs(25)
            }
        );
        assert_eq!(
            policy.after_failure(5),
            RetryState::Exhausted { attempts: 5 }
        );
    }

    #[test]
    fn test_attempt_zero_is_exhausted() {
        let policy = RetryPolicy::new(schedule());
        assert_eq!(
            policy.after_failure(0),
            RetryState::Exhausted { attempts: 0 }
        );
        assert_eq!(
            RetryPolicy::new(vec![]).after_failure(0),
            RetryState::Exhausted { attempts: 0 }
        );
    }

    #[test]
    fn test_empty_schedule_still_attempts_once() {
        let policy = RetryPolicy::new(vec![]);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(
            policy.after_failure(1),
            RetryState::Exhausted { attempts: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_failures_with_k_backoffs() {
        for k in 0..5 {
            let transport = Arc::new(FakeTransport::new());
            transport.flaky_route(URL, k, 200, "<html></html>");
            let fetcher = RetryingFetcher::new(transport.clone(), RetryPolicy::new(schedule()));

            let started = Instant::now();
            let body = fetcher.fetch(URL, &CancellationToken::new()).await.unwrap();
            let elapsed = started.elapsed();

            let expected: Duration = schedule()[..k].iter().sum();
            assert_eq!(body, "<html></html>");
            assert_eq!(transport.request_count(URL), k + 1);
            assert!(
                elapsed >= expected && elapsed < expected + Duration::from_millis(5),
                "k={} slept {:?}, expected {:?}",
                k,
                elapsed,
                expected
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_target_exhausts_schedule() {
        let transport = Arc::new(FakeTransport::new());
        transport.route(URL, 500, "");
        let fetcher = RetryingFetcher::new(transport.clone(), RetryPolicy::new(schedule()));

        let result = fetcher.fetch(URL, &CancellationToken::new()).await;

        assert_eq!(
            result,
            Err(FetchError::UnexpectedStatus {
                url: URL.to_string(),
                status: 500
            })
        );
        assert_eq!(transport.request_count(URL), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_200_success_codes_are_failures() {
        let transport = Arc::new(FakeTransport::new());
        transport.route(URL, 204, "");
        let fetcher = RetryingFetcher::new(
            transport.clone(),
            RetryPolicy::new(vec![Duration::from_millis(1); 2]),
        );

        let result = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(FetchError::UnexpectedStatus { status: 204, .. })
        ));
        assert_eq!(transport.request_count(URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_returned_after_exhaustion() {
        let fetcher = RetryingFetcher::new(
            Arc::new(UnreachableTransport),
            RetryPolicy::new(vec![Duration::from_secs(1); 3]),
        );

        let result = fetcher.fetch(URL, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(FetchError::Transport {
                source: TransportError::Connect(_),
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_cuts_backoff_short() {
        let transport = Arc::new(FakeTransport::new());
        transport.route(URL, 503, "");
        let fetcher = Arc::new(RetryingFetcher::new(
            transport.clone(),
            RetryPolicy::new(vec![Duration::from_secs(60); 5]),
        ));
        let cancel = CancellationToken::new();

        let handle = {
            let fetcher = Arc::clone(&fetcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { fetcher.fetch(URL, &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let started = Instant::now();
        let result = handle.await.unwrap();
        assert!(result.as_ref().unwrap_err().is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(transport.request_count(URL), 1);
    }
}
