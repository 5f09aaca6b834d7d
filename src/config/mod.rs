//! Configuration module for Shoreline
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default except the seed URL, which may instead come from the
//! command line.
//!
//! # Example
//!
//! ```no_run
//! use shoreline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shoreline.toml")).unwrap();
//! println!("Max concurrent requests: {}", config.crawler.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SpacingMode, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, resolve_seed};
pub use validation::validate;
