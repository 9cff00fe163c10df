//! Wire formats exchanged over the work queue

use crate::crawler::PageSignals;
use crate::queue::QueueError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An inbound crawl request, as produced by the intake API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub run_id: i64,
    pub project_id: i64,
    pub start_url: String,
    pub max_pages: u32,
}

impl CrawlJob {
    /// Decodes and validates a crawl job message
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - A well-formed job
    /// * `Err(QueueError::Malformed)` - Invalid JSON, missing fields, or `max_pages` < 1
    pub fn from_json(raw: &str) -> Result<Self, QueueError> {
        let job: CrawlJob = serde_json::from_str(raw)
            .map_err(|e| QueueError::Malformed(format!("invalid crawl job JSON: {}", e)))?;

        if job.max_pages < 1 {
            return Err(QueueError::Malformed(format!(
                "crawl job for run {} has max_pages = 0",
                job.run_id
            )));
        }

        Ok(job)
    }
}

/// An outbound page message for the analysis stage
///
/// `run_id`, `url`, `status_code`, `title`, `description` and `h1_tags` are
/// the keys the analysis stage depends on. The rest widens the message with
/// the remaining page signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMessage {
    pub run_id: i64,
    pub url: String,
    pub status_code: u16,
    pub title: String,
    pub description: String,
    pub h1_tags: Vec<String>,
    #[serde(default)]
    pub headings: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub meta_tags: BTreeMap<String, String>,
    pub links: Vec<String>,
    pub canonical_url: String,
    pub has_robots_meta: bool,
    pub robots_content: String,
    pub load_time_ms: u64,
    pub extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageMessage {
    /// Builds the message for a successfully extracted page
    pub fn from_signals(run_id: i64, signals: &PageSignals) -> Self {
        Self {
            run_id,
            url: signals.url.clone(),
            status_code: signals.status_code,
            title: signals.title.clone(),
            description: signals.meta_description.clone(),
            h1_tags: signals.h1_tags.clone(),
            headings: signals.headings.clone(),
            meta_tags: signals.meta_tags.clone(),
            links: signals.all_links.clone(),
            canonical_url: signals.canonical_url.clone(),
            has_robots_meta: signals.has_robots_meta,
            robots_content: signals.robots_content.clone(),
            load_time_ms: signals.load_time_ms,
            extracted_at: signals.extracted_at,
            error: None,
        }
    }

    /// Builds the message for a page that answered but yielded no signals
    pub fn failed_page(
        run_id: i64,
        url: &str,
        status_code: u16,
        load_time_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            url: url.to_string(),
            status_code,
            title: String::new(),
            description: String::new(),
            h1_tags: Vec::new(),
            headings: BTreeMap::new(),
            meta_tags: BTreeMap::new(),
            links: Vec::new(),
            canonical_url: String::new(),
            has_robots_meta: false,
            robots_content: String::new(),
            load_time_ms,
            extracted_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}
