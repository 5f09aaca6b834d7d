//! Crawler coordinator - wires one crawl run together
//!
//! This module turns a validated configuration into a running crawl:
//! - Resolving the seed and crawl scope
//! - Creating the output directory and optional manifest
//! - Loading robots.txt and adopting its Crawl-delay
//! - Running the scheduler, optionally under a time limit

use crate::config::{resolve_seed, Config};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::HtmlLinkExtractor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::scheduler::CrawlScheduler;
use crate::output::CrawlStatistics;
use crate::robots::{self, product_token};
use crate::storage::{FilePageStore, Manifest};
use crate::{Result, ShoreError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    seed: Url,
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<RateLimiter>,
    scheduler: CrawlScheduler,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration with a seed URL
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ShoreError)` - Missing/invalid seed, output directory could not be
    ///   created or the HTTP client could not be built
    pub async fn new(config: Config) -> Result<Self> {
        let (seed, scope) = resolve_seed(&config)?;

        let html_dir = Path::new(&config.output.html_dir);
        tokio::fs::create_dir_all(html_dir)
            .await
            .map_err(|source| ShoreError::OutputDir {
                path: config.output.html_dir.clone(),
                source,
            })?;

        let user_agent = config.user_agent.header_value();
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::from_config(&config.user_agent)?);
        let limiter = Arc::new(RateLimiter::new(
            config.crawler.max_concurrent as usize,
            Duration::from_millis(config.crawler.min_interval_ms),
            config.crawler.spacing,
        ));

        let mut scheduler = CrawlScheduler::new(
            fetcher.clone(),
            Arc::new(FilePageStore::new(html_dir)),
            Arc::new(HtmlLinkExtractor::new()),
            limiter.clone(),
            scope,
            user_agent,
        );

        if let Some(path) = &config.output.manifest_path {
            match Manifest::open(Path::new(path)) {
                Ok(manifest) => {
                    tracing::info!("Recording manifest in {}", path);
                    scheduler = scheduler.with_manifest(Arc::new(manifest));
                }
                Err(e) => tracing::warn!("Manifest disabled, cannot open {}: {}", path, e),
            }
        }

        Ok(Self {
            config,
            seed,
            fetcher,
            limiter,
            scheduler,
        })
    }

    /// Runs the crawl to completion (or until the time limit)
    ///
    /// # Returns
    ///
    /// Final statistics for the run
    pub async fn run(self) -> Result<CrawlStatistics> {
        let user_agent = self.config.user_agent.header_value();

        let rules = robots::load(self.fetcher.as_ref(), &self.limiter, &self.seed)
            .await
            .map(Arc::new);

        if self.config.crawler.respect_crawl_delay {
            let delay = rules
                .as_ref()
                .and_then(|rules| rules.crawl_delay(product_token(&user_agent)))
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
            if let Some(delay) = delay {
                self.limiter.raise_interval(delay).await;
            }
        }

        tracing::info!(
            "Starting crawl of {} (interval {:?}, max concurrent {})",
            self.seed,
            self.limiter.interval().await,
            self.limiter.max_concurrent()
        );

        let crawl = self.scheduler.run(self.seed.clone(), rules);
        let timed_out = match self.config.crawler.max_duration_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), crawl)
                .await
                .is_err(),
            None => {
                crawl.await;
                false
            }
        };

        if timed_out {
            self.limiter.close();
            tracing::warn!("Time limit reached, outstanding requests cancelled");
        } else {
            tracing::info!("Crawl completed");
        }

        let mut stats = self.scheduler.statistics();
        stats.finish(timed_out);
        Ok(stats)
    }
}

/// Runs a complete crawl for `config`
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl finished (or hit its time limit)
/// * `Err(ShoreError)` - Crawl could not start
pub async fn run_crawl(config: Config) -> Result<CrawlStatistics> {
    Coordinator::new(config).await?.run().await
}
