use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawl worker
///
/// Every section and key is optional; missing values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link distance from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent fetch-extract pipelines per job
    #[serde(rename = "max-concurrent-pages-open")]
    pub max_concurrent_pages_open: u32,

    /// Maximum number of in-flight requests per domain
    #[serde(rename = "per-domain-concurrency")]
    pub per_domain_concurrency: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "minimum-time-on-page")]
    pub minimum_time_on_page: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops followed for one request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.minimum_time_on_page)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_concurrent_pages_open: 2,
            per_domain_concurrency: 2,
            minimum_time_on_page: 1000,
            request_timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the client tag sent with every request
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesized part omitted when no contact details are configured.
    pub fn user_agent_string(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        let contacts: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contacts.is_empty() {
            base
        } else {
            format!("{} ({})", base, contacts.join("; "))
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SEO-Tech-Platform-Bot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// Work queue configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Redis connection URL
    #[serde(rename = "redis-url")]
    pub redis_url: String,

    /// List holding inbound crawl jobs
    #[serde(rename = "crawl-queue")]
    pub crawl_queue: String,

    /// List receiving extracted pages
    #[serde(rename = "analysis-queue")]
    pub analysis_queue: String,

    /// Blocking-wait bound for one receive call (seconds)
    #[serde(rename = "receive-timeout-secs")]
    pub receive_timeout_secs: u64,

    /// Additional publish attempts after the first one fails
    #[serde(rename = "publish-retries")]
    pub publish_retries: u32,

    /// Delay between publish attempts (milliseconds)
    #[serde(rename = "publish-retry-delay-ms")]
    pub publish_retry_delay_ms: u64,

    /// Pause after a failed receive before trying again (milliseconds)
    #[serde(rename = "error-backoff-ms")]
    pub error_backoff_ms: u64,
}

impl QueueConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }

    pub fn publish_retry_delay(&self) -> Duration {
        Duration::from_millis(self.publish_retry_delay_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            crawl_queue: "crawl_queue".to_string(),
            analysis_queue: "analysis_queue".to_string(),
            receive_timeout_secs: 5,
            publish_retries: 3,
            publish_retry_delay_ms: 500,
            error_backoff_ms: 1000,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding projects and audit runs
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "seo_crawler.db".to_string(),
        }
    }
}
