//! Admission control for page tasks
//!
//! This module handles:
//! - Global concurrency limiting via a counting semaphore
//! - Cancellation-aware admission (fails fast once the crawl is cancelled)
//! - In-flight and peak in-flight accounting

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Reasons a page task could not be admitted
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("crawl was cancelled before admission")]
    Cancelled,

    #[error("admission semaphore is closed")]
    Closed,
}

/// A granted admission
///
/// Holds one semaphore permit. Dropping it, on any exit path of the task
/// that owns it, frees the slot for the next page.
pub struct Admission {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the in-flight count
        // never exceeds the number of outstanding permits.
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Admits at most `capacity` page tasks at a time
///
/// The gate coordinates:
/// - The concurrency cap (semaphore permits)
/// - The crawl's cancellation signal
/// - Instrumentation used by reports and tests
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` permits (at least one)
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            cancel,
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits for a free slot
    ///
    /// # Returns
    ///
    /// * `Ok(Admission)` - A slot was granted
    /// * `Err(AdmissionError::Cancelled)` - The crawl was cancelled before or
    ///   while waiting
    /// * `Err(AdmissionError::Closed)` - The semaphore refused the permit
    pub async fn admit(&self) -> Result<Admission, AdmissionError> {
        if self.cancel.is_cancelled() {
            return Err(AdmissionError::Cancelled);
        }

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AdmissionError::Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit.map_err(|_| AdmissionError::Closed)?
            }
        };

        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);

        Ok(Admission {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of admissions currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of admissions held at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Acquire)
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
