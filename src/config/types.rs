use serde::Deserialize;

/// Main configuration structure for Shoreline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from (may also be given on the command line)
    #[serde(rename = "seed-url", default)]
    pub seed_url: Option<String>,

    /// Prefix discovered URLs must start with (defaults to the seed's origin)
    #[serde(rename = "scope-prefix", default)]
    pub scope_prefix: Option<String>,

    /// Minimum time between request starts (milliseconds)
    #[serde(rename = "min-interval-ms", default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Whether the interval is measured from the previous start or completion
    #[serde(default)]
    pub spacing: SpacingMode,

    /// Raise the interval to the robots.txt Crawl-delay when it is longer
    #[serde(rename = "respect-crawl-delay", default = "default_true")]
    pub respect_crawl_delay: bool,

    /// Abort the crawl after this many seconds
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: None,
            scope_prefix: None,
            min_interval_ms: default_min_interval_ms(),
            max_concurrent: default_max_concurrent(),
            spacing: SpacingMode::default(),
            respect_crawl_delay: true,
            max_duration_secs: None,
        }
    }
}

/// Reference point for the minimum interval between requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingMode {
    /// Consecutive starts are at least the interval apart
    #[default]
    Start,
    /// A start waits the interval after the previous start or completion,
    /// whichever came last
    Completion,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL)` or `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        match &self.contact_email {
            Some(email) => format!(
                "{}/{} (+{}; {})",
                self.crawler_name, self.crawler_version, self.contact_url, email
            ),
            None => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            ),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
            contact_email: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one file per persisted page
    #[serde(rename = "html-dir", default = "default_html_dir")]
    pub html_dir: String,

    /// Optional SQLite manifest mapping URLs to files and outcomes
    #[serde(rename = "manifest-path", default)]
    pub manifest_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_dir: default_html_dir(),
            manifest_path: None,
        }
    }
}

fn default_min_interval_ms() -> u64 {
    2000
}

fn default_max_concurrent() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_crawler_name() -> String {
    "ShoreLine".to_string()
}

fn default_crawler_version() -> String {
    "1.0".to_string()
}

fn default_contact_url() -> String {
    "http://example.com/bot-info".to_string()
}

fn default_html_dir() -> String {
    "./html".to_string()
}
