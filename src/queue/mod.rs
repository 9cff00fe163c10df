//! Work queue integration
//!
//! This module contains:
//! - The inbound (`CrawlJob`) and outbound (`PageMessage`) wire formats
//! - The `MessageQueue` transport trait over a durable list-based queue
//! - A Redis transport and an in-process transport
//! - `QueueAdapter`, which applies receive timeouts and publish retries

mod adapter;
mod memory;
mod messages;
mod redis;

pub use adapter::QueueAdapter;
pub use memory::MemoryQueue;
pub use messages::{CrawlJob, PageMessage};
pub use self::redis::RedisQueue;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the work queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue connection error: {0}")]
    Connection(String),

    #[error("Queue command failed: {0}")]
    Command(String),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// A durable, list-based message transport
///
/// Messages are pushed to the tail of a named list and popped from its head.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Checks that the queue is reachable
    async fn ping(&self) -> QueueResult<()>;

    /// Pops the head of `channel`, waiting up to `timeout` for a message
    ///
    /// Returns `Ok(None)` when the wait times out.
    async fn pop(&self, channel: &str, timeout: Duration) -> QueueResult<Option<String>>;

    /// Appends one message to the tail of `channel`
    async fn push(&self, channel: &str, payload: &str) -> QueueResult<()>;
}
