//! Page state definitions for tracking crawl progress
//!
//! Every discovered URL walks this machine once per run:
//! `Discovered -> {OutOfScope | Duplicate | RobotsDenied | Queued} -> Fetching -> {Persisted | Redirected | Failed}`.
//!
//! A redirect target is not fetched by the same request: it goes back through
//! admission as a newly discovered URL.

use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// Link was found on a page but has not been checked for admission
    Discovered,

    /// Admitted and waiting for its turn in the rate limiter
    Queued,

    /// Request is in flight
    Fetching,

    // ===== Terminal Success States =====
    /// Body was written to the page store
    Persisted,

    /// Server answered 3xx; the target was handed to admission
    Redirected,

    // ===== Terminal Skip States =====
    /// URL lies outside the crawl scope
    OutOfScope,

    /// URL was already admitted earlier in this run
    Duplicate,

    /// robots.txt disallows the URL for our user agent
    RobotsDenied,

    // ===== Terminal Error States =====
    /// Network error, non-2xx status or write failure
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Returns true if admission turned the URL away
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::OutOfScope | Self::Duplicate | Self::RobotsDenied)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Converts the page state to a database string representation
    ///
    /// This is used for storing the state in the manifest database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Persisted => "persisted",
            Self::Redirected => "redirected",
            Self::OutOfScope => "out_of_scope",
            Self::Duplicate => "duplicate",
            Self::RobotsDenied => "robots_denied",
            Self::Failed => "failed",
        }
    }

    /// Parses a page state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "queued" => Some(Self::Queued),
            "fetching" => Some(Self::Fetching),
            "persisted" => Some(Self::Persisted),
            "redirected" => Some(Self::Redirected),
            "out_of_scope" => Some(Self::OutOfScope),
            "duplicate" => Some(Self::Duplicate),
            "robots_denied" => Some(Self::RobotsDenied),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Queued,
            Self::Fetching,
            Self::Persisted,
            Self::Redirected,
            Self::OutOfScope,
            Self::Duplicate,
            Self::RobotsDenied,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
