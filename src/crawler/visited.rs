//! Admission ledger for one crawl run

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Set of URLs admitted during a run
///
/// Entries are added before any fetch and never removed, so each normalized
/// URL is admitted at most once no matter how many pages link to it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited
    ///
    /// Returns `true` if the URL was not seen before. The check and the insert
    /// happen under one lock.
    pub fn admit(&self, url: &Url) -> bool {
        self.lock().insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.lock().contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panicking holder cannot leave the set half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
