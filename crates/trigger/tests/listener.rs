//! Listener loop tests against a scripted in-memory queue.
//!
//! The queue seam lets these tests feed the listener a read failure and a
//! malformed entry and verify the loop keeps consuming afterwards.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use courier_common::error::CourierError;
use courier_common::types::NotificationPayload;
use courier_pipeline::Pipeline;
use courier_store::DocumentStore;
use courier_transport::{BatchReceipt, PushTransport};
use courier_trigger::listener::{EventQueue, MessageListener};

/// Store with no documents; every chat lookup is a miss.
struct EmptyStore;

#[async_trait]
impl DocumentStore for EmptyStore {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Value>, CourierError> {
        Ok(None)
    }
}

struct NoopTransport;

#[async_trait]
impl PushTransport for NoopTransport {
    async fn send_batch(
        &self,
        _tokens: &[String],
        _payload: &NotificationPayload,
    ) -> Result<BatchReceipt, CourierError> {
        Ok(BatchReceipt::default())
    }
}

/// Queue that fails once, serves a malformed entry, serves a valid event,
/// then signals and parks forever.
struct ScriptedQueue {
    calls: usize,
    drained: Option<oneshot::Sender<()>>,
}

#[async_trait]
impl EventQueue for ScriptedQueue {
    async fn pop(&mut self, _timeout_secs: u64) -> Result<Option<String>, CourierError> {
        self.calls += 1;
        match self.calls {
            1 => Err(CourierError::Internal("connection reset".to_string())),
            2 => Ok(Some("not json".to_string())),
            3 => Ok(Some(
                r#"{"chat_id": "c1", "message_id": "m1", "message": {"senderId": "u1"}}"#
                    .to_string(),
            )),
            _ => {
                if let Some(tx) = self.drained.take() {
                    let _ = tx.send(());
                }
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[tokio::test]
async fn queue_read_failure_does_not_stop_the_listener() {
    let (tx, rx) = oneshot::channel();
    let pipeline = Pipeline::new(Arc::new(EmptyStore), Arc::new(NoopTransport));
    let mut listener = MessageListener::new(
        ScriptedQueue {
            calls: 0,
            drained: Some(tx),
        },
        pipeline,
    );

    tokio::spawn(async move {
        let _ = listener.run().await;
    });

    // The listener only reaches the signalling pop if it survived the read
    // failure (one backoff sleep) and the malformed entry.
    tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .expect("listener stopped consuming after a queue read failure")
        .unwrap();
}
