//! Output module for crawl summaries
//!
//! This module handles recording and printing per-run crawl statistics.

pub mod stats;

pub use stats::{print_statistics, CrawlStatistics};
