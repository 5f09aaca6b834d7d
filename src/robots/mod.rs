//! Robots.txt handling module
//!
//! robots.txt is fetched once per run, before the seed. Any failure to obtain
//! it (network error, non-2xx status) leaves the crawl unrestricted.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::{FetchResult, Fetcher, RateLimiter};
use crate::url::robots_url;
use url::Url;

/// Reduces a User-Agent header value to its product token
///
/// `ShoreLine/1.0 (+http://example.com/bot-info)` becomes `ShoreLine`.
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}

/// Redirect hops followed for robots.txt before giving up
const MAX_ROBOTS_REDIRECTS: usize = 5;

/// Fetches and parses robots.txt for the seed's origin
///
/// Every request, redirect hops included, goes through the rate limiter
/// like any page fetch.
///
/// # Returns
///
/// * `Some(ParsedRobots)` - robots.txt was fetched with a 2xx status
/// * `None` - robots.txt is unavailable; every URL is allowed
pub async fn load(fetcher: &dyn Fetcher, limiter: &RateLimiter, seed: &Url) -> Option<ParsedRobots> {
    let mut url = match robots_url(seed) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot derive robots.txt URL for {}: {}", seed, e);
            return None;
        }
    };

    for _ in 0..=MAX_ROBOTS_REDIRECTS {
        tracing::debug!("Fetching {}", url);

        let result = match limiter.schedule(fetcher.fetch(&url)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("robots.txt fetch not scheduled: {}", e);
                return None;
            }
        };

        match result {
            FetchResult::Success { body, .. } => {
                let content = String::from_utf8_lossy(&body);
                tracing::info!("Loaded robots.txt from {} ({} bytes)", url, body.len());
                return Some(ParsedRobots::from_content(&content));
            }
            FetchResult::Redirect { location, .. } => {
                tracing::debug!("robots.txt at {} redirected to {}", url, location);
                url = location;
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!(
                    "robots.txt returned HTTP {}, crawling without restrictions",
                    status_code
                );
                return None;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!(
                    "robots.txt unavailable ({}), crawling without restrictions",
                    error
                );
                return None;
            }
        }
    }

    tracing::warn!("robots.txt redirected too often, crawling without restrictions");
    None
}

/// Checks if a URL is allowed by robots.txt
///
/// # Arguments
///
/// * `robots` - The parsed robots.txt data, `None` when it could not be loaded
/// * `url` - The URL to check
/// * `user_agent` - The full User-Agent header value
///
/// # Returns
///
/// * `true` - If the URL is allowed
/// * `false` - If the URL is disallowed
pub fn is_allowed(robots: Option<&ParsedRobots>, url: &Url, user_agent: &str) -> bool {
    match robots {
        Some(robots) => robots.is_allowed(url, product_token(user_agent)),
        None => true,
    }
}
