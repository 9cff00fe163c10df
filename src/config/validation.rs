use crate::config::types::{Config, CrawlerConfig, QueueConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_queue_config(&config.queue)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_concurrent_pages_open < 1 || config.max_concurrent_pages_open > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages_open must be between 1 and 100, got {}",
            config.max_concurrent_pages_open
        )));
    }

    if config.per_domain_concurrency < 1 || config.per_domain_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "per_domain_concurrency must be between 1 and 100, got {}",
            config.per_domain_concurrency
        )));
    }

    if config.minimum_time_on_page > 60_000 {
        return Err(ConfigError::Validation(format!(
            "minimum_time_on_page must be <= 60000ms, got {}ms",
            config.minimum_time_on_page
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
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

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.redis_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid redis_url: {}", e)))?;

    if url.scheme() != "redis" && url.scheme() != "rediss" {
        return Err(ConfigError::InvalidUrl(format!(
            "redis_url must use the redis:// or rediss:// scheme, got '{}'",
            config.redis_url
        )));
    }

    if config.crawl_queue.trim().is_empty() || config.analysis_queue.trim().is_empty() {
        return Err(ConfigError::Validation(
            "queue names cannot be empty".to_string(),
        ));
    }

    if config.crawl_queue == config.analysis_queue {
        return Err(ConfigError::Validation(format!(
            "crawl_queue and analysis_queue must differ, both are '{}'",
            config.crawl_queue
        )));
    }

    if config.receive_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "receive_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.publish_retries > 100 {
        return Err(ConfigError::Validation(format!(
            "publish_retries must be <= 100, got {}",
            config.publish_retries
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
