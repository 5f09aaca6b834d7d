//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - HTML parsing and link extraction
//! - Global rate limiting and admission of discovered URLs
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;
mod scheduler;
mod visited;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchResult, Fetcher, HttpFetcher};
pub use parser::{HtmlLinkExtractor, LinkExtractor};
pub use rate_limiter::RateLimiter;
pub use scheduler::{CrawlScheduler, CrawlTask};
pub use visited::VisitedSet;
