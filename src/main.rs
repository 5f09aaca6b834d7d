//! Shoreline main entry point
//!
//! This is the command-line interface for the Shoreline crawler.

use anyhow::Context;
use clap::Parser;
use shoreline::config::{load_config_with_hash, resolve_seed, validate, Config};
use shoreline::crawler::run_crawl;
use shoreline::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shoreline: a polite single-origin web crawler
///
/// Shoreline starts from a seed URL and saves every reachable page of the
/// same site to disk, one file per URL, while respecting robots.txt and a
/// global request rate limit.
#[derive(Parser, Debug)]
#[command(name = "shoreline")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-origin web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// URL to start crawling from (overrides crawler.seed-url)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Directory pages are saved to (overrides output.html-dir)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Minimum milliseconds between request starts (overrides crawler.min-interval-ms)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Maximum requests in flight (overrides crawler.max-concurrent)
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// SQLite manifest of per-URL outcomes (overrides output.manifest-path)
    #[arg(long, value_name = "PATH")]
    manifest: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;
    resolve_seed(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shoreline=info,warn"),
            1 => EnvFilter::new("shoreline=debug,info"),
            2 => EnvFilter::new("shoreline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = Some(seed.clone());
    }
    if let Some(output) = &cli.output {
        config.output.html_dir = output.clone();
    }
    if let Some(interval) = cli.interval_ms {
        config.crawler.min_interval_ms = interval;
    }
    if let Some(max) = cli.max_concurrent {
        config.crawler.max_concurrent = max;
    }
    if let Some(manifest) = &cli.manifest {
        config.output.manifest_path = Some(manifest.clone());
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let (seed, scope) = resolve_seed(config)?;

    println!("=== Shoreline Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", seed);
    println!("  Scope: {}", scope.prefix());

    println!("\nCrawler Configuration:");
    println!("  Min interval: {}ms", config.crawler.min_interval_ms);
    println!("  Max concurrent: {}", config.crawler.max_concurrent);
    println!("  Spacing: {:?}", config.crawler.spacing);
    println!(
        "  Respect Crawl-delay: {}",
        config.crawler.respect_crawl_delay
    );
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Time limit: {}s", secs),
        None => println!("  Time limit: none"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  HTML directory: {}", config.output.html_dir);
    match &config.output.manifest_path {
        Some(path) => println!("  Manifest: {}", path),
        None => println!("  Manifest: disabled"),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let stats = run_crawl(config).await.context("Crawl failed to start")?;
    print_statistics(&stats);
    Ok(())
}
