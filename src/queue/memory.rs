//! In-process list transport
//!
//! Same semantics as the Redis transport (FIFO lists, timed blocking pop),
//! used for local runs and tests without a Redis server.

use crate::queue::{MessageQueue, QueueError, QueueResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    pushed: Notify,
    offline: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while offline every operation fails with a
    /// connection error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of messages waiting on `channel`
    pub fn len(&self, channel: &str) -> usize {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel: &str) -> bool {
        self.len(channel) == 0
    }

    /// Removes and returns every message waiting on `channel`, oldest first
    pub fn drain(&self, channel: &str) -> Vec<String> {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(channel)
            .map(|list| list.drain(..).collect())
            .unwrap_or_default()
    }

    fn check_online(&self) -> QueueResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(QueueError::Connection("queue is offline".to_string()));
        }
        Ok(())
    }

    fn try_pop(&self, channel: &str) -> Option<String> {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(channel)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn ping(&self) -> QueueResult<()> {
        self.check_online()
    }

    async fn pop(&self, channel: &str, timeout: Duration) -> QueueResult<Option<String>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.check_online()?;

            // Register for wakeups before checking so a push in between is not lost
            let notified = self.pushed.notified();
            if let Some(payload) = self.try_pop(channel) {
                return Ok(Some(payload));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn push(&self, channel: &str, payload: &str) -> QueueResult<()> {
        self.check_online()?;

        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel.to_string())
            .or_default()
            .push_back(payload.to_string());
        self.pushed.notify_waiters();

        Ok(())
    }
}
