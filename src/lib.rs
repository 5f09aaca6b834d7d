//! Shoreline: a polite single-origin web crawler
//!
//! This crate crawls every reachable page under one origin, stores each page's
//! raw bytes on disk, respects robots.txt and never fetches a URL twice in a run.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Shoreline operations
#[derive(Debug, Error)]
pub enum ShoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Rate limiter closed")]
    LimiterClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No seed URL given (set crawler.seed-url or pass --seed)")]
    MissingSeed,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Seed {seed} lies outside scope {prefix}")]
    SeedOutOfScope { seed: String, prefix: String },
}

/// Result type alias for Shoreline operations
pub type Result<T> = std::result::Result<T, ShoreError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::PageState;
pub use crate::url::{normalize_url, Scope};
