//! Job intake and page publication on top of a `MessageQueue`

use crate::config::QueueConfig;
use crate::queue::{CrawlJob, MessageQueue, PageMessage, QueueError, QueueResult};
use serde::Serialize;
use std::sync::Arc;

/// Receives crawl jobs and publishes page messages
///
/// Cheap to clone: every crawl pipeline holds its own handle to the same
/// transport.
#[derive(Clone)]
pub struct QueueAdapter {
    transport: Arc<dyn MessageQueue>,
    config: QueueConfig,
}

impl QueueAdapter {
    pub fn new(transport: Arc<dyn MessageQueue>, config: QueueConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub async fn ping(&self) -> QueueResult<()> {
        self.transport.ping().await
    }

    /// Waits up to the receive timeout for the next crawl job
    ///
    /// # Returns
    ///
    /// * `Ok(Some(job))` - A well-formed job was dequeued
    /// * `Ok(None)` - Nothing arrived before the timeout
    /// * `Err(QueueError::Malformed)` - A message was dequeued but is not a valid job
    /// * `Err(_)` - The transport failed
    pub async fn receive(&self) -> QueueResult<Option<CrawlJob>> {
        let raw = self
            .transport
            .pop(&self.config.crawl_queue, self.config.receive_timeout())
            .await?;

        match raw {
            Some(raw) => CrawlJob::from_json(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Serializes `message` and appends it to `channel`, retrying transport
    /// failures up to the configured number of times
    pub async fn publish<T: Serialize>(&self, channel: &str, message: &T) -> QueueResult<()> {
        let payload = serde_json::to_string(message)?;
        let attempts = self.config.publish_retries.saturating_add(1);
        let mut last_error: Option<QueueError> = None;

        for attempt in 1..=attempts {
            match self.transport.push(channel, &payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        channel = channel,
                        attempt = attempt,
                        attempts = attempts,
                        "Publish failed: {}",
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.publish_retry_delay()).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| QueueError::Command(format!("publish to {} not attempted", channel))))
    }

    /// Publishes a page message to the analysis queue
    pub async fn publish_page(&self, message: &PageMessage) -> QueueResult<()> {
        self.publish(&self.config.analysis_queue, message).await
    }

    /// Enqueues a crawl job on the crawl queue, as the intake API does
    pub async fn submit_job(&self, job: &CrawlJob) -> QueueResult<()> {
        self.publish(&self.config.crawl_queue, job).await
    }
}
