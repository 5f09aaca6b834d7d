//! Per-run crawl statistics
//!
//! Counters are updated by the scheduler as URLs reach their states and
//! printed once the run is over.

use crate::state::PageState;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Count of URLs by the state they reached
    pub pages_by_state: HashMap<PageState, u64>,

    /// Total bytes written to the page store
    pub bytes_persisted: u64,

    /// Links extracted from fetched pages (before admission)
    pub links_discovered: u64,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run ended, if it has
    pub finished_at: Option<DateTime<Utc>>,

    /// Whether the run was cut short by its deadline
    pub timed_out: bool,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStatistics {
    /// Starts a new set of counters
    pub fn new() -> Self {
        Self {
            pages_by_state: HashMap::new(),
            bytes_persisted: 0,
            links_discovered: 0,
            started_at: Utc::now(),
            finished_at: None,
            timed_out: false,
        }
    }

    /// Counts one URL reaching `state`
    pub fn record(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    /// Number of URLs that reached `state`
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// URLs that were fetched, successfully or not
    pub fn total_fetched(&self) -> u64 {
        self.count(PageState::Persisted) + self.count(PageState::Failed)
    }

    /// Marks the run as finished
    pub fn finish(&mut self, timed_out: bool) {
        self.finished_at = Some(Utc::now());
        self.timed_out = timed_out;
    }

    /// Wall-clock duration of the run so far (or in total, once finished)
    pub fn elapsed(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    println!("  Duration: {}s", stats.elapsed().num_seconds());
    println!("  Pages fetched: {}", stats.total_fetched());
    println!("  Bytes saved: {}", stats.bytes_persisted);
    println!("  Links found: {}", stats.links_discovered);
    if stats.timed_out {
        println!("  Stopped early: time limit reached");
    }
    println!();

    println!("Pages by State:");
    let mut state_counts: Vec<_> = stats
        .pages_by_state
        .iter()
        .filter(|(_, count)| **count > 0)
        .collect();
    // Sort states by count (descending), then by state for stable output
    state_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    for (state, count) in state_counts {
        println!("  {}: {}", state, count);
    }
    println!();

    let persisted = stats.count(PageState::Persisted);
    let fetched = stats.total_fetched();
    let success_rate = if fetched > 0 {
        (persisted as f64 / fetched as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetched pages saved)",
        success_rate, persisted, fetched
    );
}
