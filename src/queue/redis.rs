//! Redis list transport

use crate::queue::{MessageQueue, QueueError, QueueResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

/// Extra time granted to the server beyond the BLPOP timeout before the
/// client gives up on the reply
const REPLY_GRACE: Duration = Duration::from_secs(2);

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            QueueError::Connection(err.to_string())
        } else {
            QueueError::Command(err.to_string())
        }
    }
}

/// A `MessageQueue` backed by Redis lists
///
/// Blocking pops and pushes go over separate connections so that a
/// long-running BLPOP never delays an outbound publish.
#[derive(Clone)]
pub struct RedisQueue {
    consumer: MultiplexedConnection,
    producer: MultiplexedConnection,
}

impl RedisQueue {
    /// Connects to Redis and verifies the server answers
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Connection URL, e.g. `redis://127.0.0.1:6379`
    ///
    /// # Returns
    ///
    /// * `Ok(RedisQueue)` - Connected and reachable
    /// * `Err(QueueError)` - Bad URL or unreachable server
    pub async fn connect(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let consumer = client.get_multiplexed_async_connection().await?;
        let producer = client.get_multiplexed_async_connection().await?;

        let queue = Self { consumer, producer };
        queue.ping().await?;

        tracing::info!("Connected to Redis at {}", redis_url);
        Ok(queue)
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.producer.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn pop(&self, channel: &str, timeout: Duration) -> QueueResult<Option<String>> {
        let mut conn = self.consumer.clone();
        // BLPOP takes whole seconds on older servers; 0 would block forever
        let seconds = timeout.as_secs().max(1);

        let mut command = redis::cmd("BLPOP");
        command.arg(channel).arg(seconds);

        let reply = tokio::time::timeout(
            Duration::from_secs(seconds) + REPLY_GRACE,
            command.query_async::<_, Option<(String, String)>>(&mut conn),
        )
        .await
        .map_err(|_| QueueError::Connection(format!("BLPOP on {} got no reply", channel)))??;

        Ok(reply.map(|(_, payload)| payload))
    }

    async fn push(&self, channel: &str, payload: &str) -> QueueResult<()> {
        let mut conn = self.producer.clone();
        let _: i64 = redis::cmd("RPUSH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
