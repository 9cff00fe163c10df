use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are NOT applied; see [`load_effective_config`].
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
/// use seo_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so operators can tell which configuration a worker runs.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Builds the configuration the worker actually runs with
///
/// Starts from the file at `path` (or the defaults when no file is given),
/// applies process environment overrides, then validates the result. This is
/// read once at startup.
///
/// # Returns
///
/// * `Ok((Config, Option<String>))` - The configuration and the file hash, if a file was read
/// * `Err(ConfigError)` - Loading, an override, or validation failed
pub fn load_effective_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            (config, Some(compute_config_hash(path)?))
        }
        None => (Config::default(), None),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

/// Applies environment overrides using the given lookup
///
/// Recognized variables: `REDIS_URL`, `CRAWL_QUEUE`, `ANALYSIS_QUEUE`,
/// `DATABASE_PATH`, `CRAWL_MAX_DEPTH`, `CRAWL_CONCURRENCY`,
/// `CRAWL_DOMAIN_CONCURRENCY`, `CRAWL_DELAY_MS`, `CRAWL_TIMEOUT_SECS`.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("REDIS_URL") {
        config.queue.redis_url = normalize_redis_url(&url);
    }
    if let Some(name) = get("CRAWL_QUEUE") {
        config.queue.crawl_queue = name;
    }
    if let Some(name) = get("ANALYSIS_QUEUE") {
        config.queue.analysis_queue = name;
    }
    if let Some(path) = get("DATABASE_PATH") {
        config.storage.database_path = path;
    }
    if let Some(value) = get("CRAWL_MAX_DEPTH") {
        config.crawler.max_depth = parse_override("CRAWL_MAX_DEPTH", &value)?;
    }
    if let Some(value) = get("CRAWL_CONCURRENCY") {
        config.crawler.max_concurrent_pages_open = parse_override("CRAWL_CONCURRENCY", &value)?;
    }
    if let Some(value) = get("CRAWL_DOMAIN_CONCURRENCY") {
        config.crawler.per_domain_concurrency =
            parse_override("CRAWL_DOMAIN_CONCURRENCY", &value)?;
    }
    if let Some(value) = get("CRAWL_DELAY_MS") {
        config.crawler.minimum_time_on_page = parse_override("CRAWL_DELAY_MS", &value)?;
    }
    if let Some(value) = get("CRAWL_TIMEOUT_SECS") {
        config.crawler.request_timeout_secs = parse_override("CRAWL_TIMEOUT_SECS", &value)?;
    }

    Ok(())
}

/// Accepts both full Redis URLs and bare `host:port` addresses
fn normalize_redis_url(value: &str) -> String {
    let value = value.trim();
    if value.contains("://") {
        value.to_string()
    } else {
        format!("redis://{}", value)
    }
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
