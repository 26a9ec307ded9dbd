//! Message-created listener — consumes trigger events from the Redis queue
//! and runs the pipeline once per event.
//!
//! The queue guarantees at-least-once delivery per created message; this
//! listener does not deduplicate repeated events for the same message id and
//! does not retry failed invocations. Re-delivery policy belongs to whoever
//! produces the queue entries.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use courier_common::error::CourierError;
use courier_common::types::MessageCreated;
use courier_pipeline::Pipeline;

/// Blocking-pop timeout, so shutdown is never stuck behind an idle queue.
const POP_TIMEOUT_SECONDS: u64 = 5;

/// Delay before re-polling after a queue read failure.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Source of trigger events.
#[async_trait]
pub trait EventQueue: Send {
    /// Wait up to `timeout_secs` for the next raw queue entry.
    async fn pop(&mut self, timeout_secs: u64) -> Result<Option<String>, CourierError>;
}

/// Redis list consumed with BLPOP.
pub struct RedisEventQueue {
    redis: ConnectionManager,
    key: String,
}

impl RedisEventQueue {
    pub fn new(redis: ConnectionManager, key: String) -> Self {
        Self { redis, key }
    }
}

#[async_trait]
impl EventQueue for RedisEventQueue {
    async fn pop(&mut self, timeout_secs: u64) -> Result<Option<String>, CourierError> {
        let entry: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.key)
            .arg(timeout_secs)
            .query_async(&mut self.redis)
            .await?;

        Ok(entry.map(|(_, raw)| raw))
    }
}

pub struct MessageListener<Q: EventQueue> {
    queue: Q,
    pipeline: Pipeline,
}

impl<Q: EventQueue> MessageListener<Q> {
    pub fn new(queue: Q, pipeline: Pipeline) -> Self {
        Self { queue, pipeline }
    }

    /// Start the listening loop. Runs indefinitely until the task is cancelled.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        tracing::info!("Message listener started");

        loop {
            let raw = match self.queue.pop(POP_TIMEOUT_SECONDS).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    // Queue read failed (e.g. Redis reconnecting) — wait
                    // briefly and poll again rather than stopping the service.
                    tracing::error!(error = %e, "Queue read failed, retrying");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            self.handle_entry(&raw).await;
        }
    }

    /// Run one pipeline invocation for a queue entry.
    ///
    /// A malformed entry is discarded; a pipeline infrastructure error fails
    /// only this invocation. Neither stops the listener.
    async fn handle_entry(&self, raw: &str) {
        let event = match parse_event(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Discarding malformed trigger event");
                return;
            }
        };

        let invocation_id = Uuid::new_v4();
        match self.pipeline.handle_message_created(&event).await {
            Ok(outcome) => {
                tracing::debug!(
                    invocation_id = %invocation_id,
                    chat_id = %event.chat_id,
                    message_id = %event.message_id,
                    outcome = %outcome,
                    "Invocation finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    invocation_id = %invocation_id,
                    chat_id = %event.chat_id,
                    message_id = %event.message_id,
                    error = %e,
                    "Invocation failed"
                );
            }
        }
    }
}

fn parse_event(raw: &str) -> Result<MessageCreated, CourierError> {
    Ok(serde_json::from_str(raw)?)
}
