//! Storage traits and error types
//!
//! This module defines the trait interface for page sinks and
//! associated error types.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("No free file name for {0}")]
    KeyExhausted(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sink for fetched page bodies
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Writes `content` for `url`, returning where it was stored
    ///
    /// Persisting the same URL again replaces the previous content.
    async fn persist(&self, url: &Url, content: &[u8]) -> StorageResult<PathBuf>;
}
