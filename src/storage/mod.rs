//! Storage module for persisting crawl output
//!
//! This module handles everything the crawler writes, including:
//! - Page bodies, one file per URL, under the output directory
//! - Collision-free file naming within a run
//! - An optional SQLite manifest of per-URL outcomes

mod filesystem;
mod manifest;
mod schema;
mod traits;

pub use filesystem::{sanitize_key, FilePageStore};
pub use manifest::{Manifest, ManifestEntry};
pub use traits::{PageStore, StorageError, StorageResult};
