//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests returning the raw response bytes
//! - Redirect reporting (the client never follows a `Location` itself)
//! - Error classification
//!
//! Fetchers never pace themselves; callers go through the
//! [`RateLimiter`](crate::crawler::RateLimiter). A redirect is one request:
//! its target is only requested once the caller has admitted it.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE, LOCATION},
    redirect::Policy,
    Client,
};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty when absent)
        content_type: String,
        /// Raw response body
        body: Vec<u8>,
    },

    /// The server answered 3xx with a usable `Location`
    Redirect {
        /// The HTTP status code
        status_code: u16,
        /// `Location` resolved against the requested URL
        location: Url,
    },

    /// The server answered with any other non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// HTTP transport used by the crawler
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET for `url` and classifies the outcome
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shoreline::config::UserAgentConfig;
/// use shoreline::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client for the given user agent configuration
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        if status.is_redirection() {
            return redirect_target(url, status.as_u16(), response.headers());
        }
        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        match response.bytes().await {
            Ok(body) => FetchResult::Success {
                status_code: status.as_u16(),
                content_type,
                body: body.to_vec(),
            },
            Err(e) => classify_error(&e),
        }
    }
}

/// Resolves the `Location` of a 3xx response
///
/// A 3xx without a usable `Location` (e.g. 304) is an [`FetchResult::HttpError`].
fn redirect_target(url: &Url, status_code: u16, headers: &HeaderMap) -> FetchResult {
    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|location| url.join(location).ok());

    match location {
        Some(location) => FetchResult::Redirect {
            status_code,
            location,
        },
        None => FetchResult::HttpError { status_code },
    }
}

/// Maps a transport error to a [`FetchResult::NetworkError`]
fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
