use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::url::{normalize_url, Scope};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if let Some(seed) = &config.seed_url {
        let seed = normalize_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if let Some(prefix) = &config.scope_prefix {
            Scope::with_prefix(&seed, prefix)
                .map_err(|e| ConfigError::Validation(format!("Invalid scope-prefix: {}", e)))?;
        }
    }

    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.min_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "min-interval-ms must be >= 100ms, got {}ms",
            config.min_interval_ms
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max-duration-secs must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Crawler name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only ASCII letters, digits, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.html_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "html-dir cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.manifest_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest-path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
