use crate::config::types::Config;
use crate::config::validation::validate;
use crate::url::{normalize_url, Scope};
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use shoreline::config::load_config;
///
/// let config = load_config(Path::new("shoreline.toml")).unwrap();
/// println!("Interval: {}ms", config.crawler.min_interval_ms);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two crawl runs can be matched to the exact
/// configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the normalized seed URL and the crawl scope from a configuration
///
/// # Returns
///
/// * `Ok((Url, Scope))` - The seed and the prefix the crawl is confined to
/// * `Err(ConfigError)` - No seed was configured, or seed/prefix are invalid
pub fn resolve_seed(config: &Config) -> ConfigResult<(Url, Scope)> {
    let raw = config
        .crawler
        .seed_url
        .as_deref()
        .ok_or(ConfigError::MissingSeed)?;

    let seed = normalize_url(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", raw, e)))?;

    let scope = match &config.crawler.scope_prefix {
        Some(prefix) => Scope::with_prefix(&seed, prefix),
        None => Scope::for_seed(&seed),
    }
    .map_err(|e| ConfigError::Validation(format!("Invalid scope: {}", e)))?;

    Ok((seed, scope))
}
