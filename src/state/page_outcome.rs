/// Terminal outcome of one page index
use std::fmt;

/// What happened to a single page index during a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    /// Fetched and parsed; its records were written to the sink
    Succeeded {
        /// Number of records the page contributed
        records: usize,
    },

    /// Retries were exhausted or the content could not be parsed
    Failed,

    /// A pending backoff was cut short by crawl cancellation
    Cancelled,

    /// Never admitted because the crawl was already cancelled
    Skipped,
}

impl PageOutcome {
    /// Returns true if the page contributed records
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Number of records the page contributed (zero unless succeeded)
    pub fn records(&self) -> usize {
        match self {
            Self::Succeeded { records } => *records,
            _ => 0,
        }
    }

    /// Returns the lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
