//! Crawl scheduler: admission, dispatch and completion tracking
//!
//! Every admitted URL becomes one task in a [`JoinSet`]. A task waits its turn
//! in the [`RateLimiter`], fetches, persists the body, extracts links and
//! admits the children it found. The admitted children are handed back to the
//! scheduler loop, which spawns them. The crawl is complete when the set is
//! empty.
//!
//! Per URL the states are:
//! `Discovered -> {OutOfScope | Duplicate | RobotsDenied | Queued} -> Fetching -> {Persisted | Redirected | Failed}`.
//!
//! A redirect's target is admitted like any discovered link, so it is checked
//! against scope, the visited set and robots.txt, and gets its own turn in
//! the rate limiter.

use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::visited::VisitedSet;
use crate::output::CrawlStatistics;
use crate::robots::{self, ParsedRobots};
use crate::state::PageState;
use crate::storage::{Manifest, PageStore};
use crate::url::{normalize_parsed, Scope};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use url::Url;

/// Log a progress line after this many saved pages
const PROGRESS_INTERVAL: u64 = 10;

/// An admitted URL waiting to be fetched
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// The URL to fetch
    pub url: Url,
    /// robots.txt rules in force for this run (`None` allows everything)
    pub rules: Option<Arc<ParsedRobots>>,
}

/// Drives one crawl run
///
/// Cloning is cheap: all collaborators are shared.
#[derive(Clone)]
pub struct CrawlScheduler {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn PageStore>,
    extractor: Arc<dyn LinkExtractor>,
    limiter: Arc<RateLimiter>,
    visited: Arc<VisitedSet>,
    scope: Scope,
    user_agent: String,
    manifest: Option<Arc<Manifest>>,
    stats: Arc<Mutex<CrawlStatistics>>,
}

impl CrawlScheduler {
    /// Creates a scheduler for a single run
    ///
    /// # Arguments
    ///
    /// * `fetcher` - HTTP transport
    /// * `store` - Sink for page bodies
    /// * `extractor` - Link extraction from page bodies
    /// * `limiter` - Shared pacing for every request of the run
    /// * `scope` - Prefix URLs must start with to be crawled
    /// * `user_agent` - Full User-Agent value, matched against robots.txt
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn PageStore>,
        extractor: Arc<dyn LinkExtractor>,
        limiter: Arc<RateLimiter>,
        scope: Scope,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            store,
            extractor,
            limiter,
            visited: Arc::new(VisitedSet::new()),
            scope,
            user_agent: user_agent.into(),
            manifest: None,
            stats: Arc::new(Mutex::new(CrawlStatistics::new())),
        }
    }

    /// Records per-URL outcomes in `manifest`
    pub fn with_manifest(mut self, manifest: Arc<Manifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// URLs admitted so far
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Snapshot of the run's counters
    pub fn statistics(&self) -> CrawlStatistics {
        self.stats().clone()
    }

    fn stats(&self) -> MutexGuard<'_, CrawlStatistics> {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decides whether a discovered URL is crawled
    ///
    /// Checks run in order: scope, visited set, robots.txt. The URL is marked
    /// visited before robots.txt is consulted, so a denied URL is evaluated
    /// only once per run.
    fn admission(&self, url: &Url, rules: Option<&ParsedRobots>) -> PageState {
        if !self.scope.contains(url) {
            return PageState::OutOfScope;
        }
        if !self.visited.admit(url) {
            return PageState::Duplicate;
        }
        if !robots::is_allowed(rules, url, &self.user_agent) {
            return PageState::RobotsDenied;
        }
        PageState::Queued
    }

    /// Admits `url`, returning a task for it when it should be fetched
    pub fn admit(&self, url: Url, rules: Option<Arc<ParsedRobots>>) -> Option<CrawlTask> {
        let state = self.admission(&url, rules.as_deref());
        match state {
            PageState::Queued => {
                tracing::trace!("Queued {}", url);
                Some(CrawlTask { url, rules })
            }
            PageState::RobotsDenied => {
                tracing::debug!("Disallowed by robots.txt: {}", url);
                self.stats().record(state);
                self.record_manifest(&url, state, None, None, None);
                None
            }
            _ => {
                tracing::trace!("Skipping {} ({})", url, state);
                self.stats().record(state);
                None
            }
        }
    }

    /// Fetches, stores and expands one task
    ///
    /// Returns the admitted children. Failures end this branch only and
    /// yield no children.
    pub async fn process(&self, task: CrawlTask) -> Vec<CrawlTask> {
        let CrawlTask { url, rules } = task;

        let fetch = async {
            tracing::debug!("Fetching {}", url);
            self.fetcher.fetch(&url).await
        };

        let result = match self.limiter.schedule(fetch).await {
            Ok(result) => result,
            Err(e) => {
                self.fail(&url, None, &e.to_string());
                return Vec::new();
            }
        };

        let (status_code, content_type, body) = match result {
            FetchResult::Success {
                status_code,
                content_type,
                body,
            } => (status_code, content_type, body),
            FetchResult::Redirect {
                status_code,
                location,
            } => return self.redirected(&url, status_code, location, rules),
            FetchResult::HttpError { status_code } => {
                self.fail(&url, Some(status_code), &format!("HTTP {}", status_code));
                return Vec::new();
            }
            FetchResult::NetworkError { error } => {
                self.fail(&url, None, &error);
                return Vec::new();
            }
        };

        let path = match self.store.persist(&url, &body).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed to save {}: {}", url, e);
                self.record_failure(&url, Some(status_code), &e.to_string());
                return Vec::new();
            }
        };
        self.persisted(&url, status_code, &path, body.len());

        if !may_contain_links(&content_type) {
            tracing::debug!("Not following links in {} ({})", url, content_type);
            return Vec::new();
        }

        let html = String::from_utf8_lossy(&body);
        let links = self.extractor.extract_links(&html, &url);
        self.stats().links_discovered += links.len() as u64;

        links
            .into_iter()
            .filter_map(|link| self.admit(link, rules.clone()))
            .collect()
    }

    /// Records a 3xx and admits its target as a discovered link
    fn redirected(
        &self,
        url: &Url,
        status_code: u16,
        location: Url,
        rules: Option<Arc<ParsedRobots>>,
    ) -> Vec<CrawlTask> {
        tracing::debug!("{} redirected ({}) to {}", url, status_code, location);
        {
            let mut stats = self.stats();
            stats.record(PageState::Redirected);
            stats.links_discovered += 1;
        }
        self.record_manifest(url, PageState::Redirected, None, Some(status_code), None);

        match normalize_parsed(location) {
            Ok(target) => self.admit(target, rules).into_iter().collect(),
            Err(e) => {
                tracing::debug!("Ignoring redirect from {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Crawls everything reachable from `seed`
    ///
    /// Returns once every spawned task has finished.
    pub async fn run(&self, seed: Url, rules: Option<Arc<ParsedRobots>>) {
        let mut tasks = JoinSet::new();

        match self.admit(seed.clone(), rules) {
            Some(task) => self.spawn(&mut tasks, task),
            None => tracing::warn!("Seed {} was not admitted, nothing to crawl", seed),
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(children) => {
                    for child in children {
                        self.spawn(&mut tasks, child);
                    }
                }
                Err(e) if e.is_panic() => tracing::error!("Crawl task panicked: {}", e),
                Err(e) => tracing::warn!("Crawl task cancelled: {}", e),
            }
        }
    }

    fn spawn(&self, tasks: &mut JoinSet<Vec<CrawlTask>>, task: CrawlTask) {
        let scheduler = self.clone();
        tasks.spawn(async move { scheduler.process(task).await });
    }

    fn persisted(&self, url: &Url, status_code: u16, path: &Path, bytes: usize) {
        let saved = {
            let mut stats = self.stats();
            stats.record(PageState::Persisted);
            stats.bytes_persisted += bytes as u64;
            stats.count(PageState::Persisted)
        };

        tracing::info!("Saved {} ({} bytes)", url, bytes);
        if saved % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages saved, {} URLs admitted",
                saved,
                self.visited.len()
            );
        }

        let file_name = path.file_name().and_then(|name| name.to_str());
        self.record_manifest(url, PageState::Persisted, file_name, Some(status_code), None);
    }

    fn fail(&self, url: &Url, status_code: Option<u16>, error: &str) {
        tracing::warn!("Failed to fetch {}: {}", url, error);
        self.record_failure(url, status_code, error);
    }

    fn record_failure(&self, url: &Url, status_code: Option<u16>, error: &str) {
        self.stats().record(PageState::Failed);
        self.record_manifest(url, PageState::Failed, None, status_code, Some(error));
    }

    fn record_manifest(
        &self,
        url: &Url,
        state: PageState,
        file_name: Option<&str>,
        status_code: Option<u16>,
        error: Option<&str>,
    ) {
        if let Some(manifest) = &self.manifest {
            if let Err(e) = manifest.record(url, state, file_name, status_code, error) {
                tracing::warn!("Failed to update manifest for {}: {}", url, e);
            }
        }
    }
}

/// Media types whose bodies are never searched for links
const OPAQUE_TYPES: &[&str] = &[
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/wasm",
];

/// Every body is searched for links unless its type is clearly binary
fn may_contain_links(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let binary_family = ["image/", "audio/", "video/", "font/"]
        .iter()
        .any(|family| essence.starts_with(family));

    !binary_family && !OPAQUE_TYPES.contains(&essence.as_str())
}
