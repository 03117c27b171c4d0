use crate::config::types::{
    CompletionMode, Config, CrawlerConfig, StorageConfig, UserAgentConfig,
};
use crate::storage::StorageBackend;
use crate::ConfigError;
use url::Url;

/// Longest accepted timeout, in milliseconds
const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;
    validate_timeout("http_timeout", config.http_timeout)?;
    validate_timeout("idle_timeout", config.idle_timeout)?;

    // A fetch still running when the idle window closes is cancelled, and
    // its failure never reaches the report.
    if config.completion == CompletionMode::Idle && config.http_timeout >= config.idle_timeout {
        return Err(ConfigError::Validation(format!(
            "http_timeout ({}ms) must be shorter than idle_timeout ({}ms) with idle completion",
            config.http_timeout, config.idle_timeout
        )));
    }

    Ok(())
}

/// The seed must be an absolute http(s) address with a host
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use the http or https scheme",
            base_url
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

fn validate_timeout(name: &str, millis: u64) -> Result<(), ConfigError> {
    if millis == 0 || millis > MAX_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1ms and {}ms, got {}ms",
            name, MAX_TIMEOUT_MS, millis
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.backend == StorageBackend::Sqlite && config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty with the sqlite backend".to_string(),
        ));
    }
    Ok(())
}
