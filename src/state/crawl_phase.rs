/// Crawl phase definitions for the orchestrator's state machine
///
/// A crawl moves `Idle → Discovering → Scheduling → Draining → Done`, or ends
/// early in `Aborted` when discovery fails or a fatal error surfaces while
/// draining.
use std::fmt;

/// Represents the current phase of one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Nothing has happened yet
    Idle,

    /// Fetching the seed page to learn the total page count
    Discovering,

    /// Admitting one page task per index under the concurrency cap
    Scheduling,

    /// Waiting for every launched page task to finish
    Draining,

    // ===== Terminal Phases =====
    /// Every launched task finished without a fatal error
    Done,

    /// Discovery failed or a fatal error cancelled the crawl
    Aborted,
}

impl CrawlPhase {
    /// Returns true if the crawl has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if the crawl ended without a fatal error
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Discovering)
                | (Self::Discovering, Self::Scheduling)
                | (Self::Discovering, Self::Aborted)
                | (Self::Scheduling, Self::Draining)
                | (Self::Draining, Self::Done)
                | (Self::Draining, Self::Aborted)
        )
    }

    /// Returns the lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Scheduling => "scheduling",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!CrawlPhase::Idle.is_terminal());
        assert!(!CrawlPhase::Discovering.is_terminal());
        assert!(!CrawlPhase::Scheduling.is_terminal());
        assert!(!CrawlPhase::Draining.is_terminal());

        assert!(CrawlPhase::Done.is_terminal());
        assert!(CrawlPhase::Aborted.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            CrawlPhase::Idle,
            CrawlPhase::Discovering,
            CrawlPhase::Scheduling,
            CrawlPhase::Draining,
            CrawlPhase::Done,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_abort_transitions() {
        assert!(CrawlPhase::Discovering.can_transition_to(CrawlPhase::Aborted));
        assert!(CrawlPhase::Draining.can_transition_to(CrawlPhase::Aborted));

        // Scheduling always drains before it can abort
        assert!(!CrawlPhase::Scheduling.can_transition_to(CrawlPhase::Aborted));
    }

    #[test]
    fn test_rejected_transitions() {
        // Discovery never re-runs once scheduling has begun
        assert!(!CrawlPhase::Scheduling.can_transition_to(CrawlPhase::Discovering));
        assert!(!CrawlPhase::Idle.can_transition_to(CrawlPhase::Scheduling));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::Idle));
        assert!(!CrawlPhase::Aborted.can_transition_to(CrawlPhase::Draining));
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::Draining.to_string(), "draining");
        assert_eq!(CrawlPhase::Aborted.to_string(), "aborted");
    }
}
