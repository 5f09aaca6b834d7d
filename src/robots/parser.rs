//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;
use url::Url;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a simplified
/// interface for checking if URLs are allowed. Rule groups are matched against
/// the crawler's product token, so callers pass `ShoreLine` rather than the full
/// User-Agent header.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ParsedRobots instance that can be used to check URL permissions
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Checks if a URL is allowed for the given product token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `product_token` - The crawler's product token (e.g. `ShoreLine`)
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &Url, product_token: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token, url.as_str())
    }

    /// Gets the crawl delay for a specific product token
    ///
    /// A group naming the token takes precedence over the `*` group.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, product_token: &str) -> Option<f64> {
        let token = product_token.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut delay_for_wildcard: Option<f64> = None;
        let mut delay_for_agent: Option<f64> = None;

        for line in self.content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group
                    if !in_agent_lines {
                        group.clear();
                    }
                    in_agent_lines = true;
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_agent_lines = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| *ua == token) {
                        delay_for_agent = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        delay_for_wildcard = Some(delay);
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}
