//! Push transport — best-effort batch delivery of one payload to many device
//! tokens.
//!
//! The pipeline makes at most one `send_batch` call per invocation and never
//! retries; a token that fails here simply misses this notification.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use courier_common::error::CourierError;
use courier_common::types::NotificationPayload;

pub use http::HttpPushTransport;

/// Delivery outcome for a single token within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub token: String,
    /// Transport-reported error string, `None` on success.
    pub error: Option<String>,
}

/// Per-token outcomes of one batch send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub results: Vec<TokenResult>,
}

impl BatchReceipt {
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Best-effort push delivery to a batch of device tokens.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver `payload` to every token in one call.
    ///
    /// `Err` means the batch call itself failed (connectivity, rejected
    /// request); per-token failures are reported inside the receipt.
    async fn send_batch(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<BatchReceipt, CourierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_counts_split_on_error_field() {
        let receipt = BatchReceipt {
            results: vec![
                TokenResult {
                    token: "t1".into(),
                    error: None,
                },
                TokenResult {
                    token: "t2".into(),
                    error: Some("NotRegistered".into()),
                },
                TokenResult {
                    token: "t3".into(),
                    error: None,
                },
            ],
        };
        assert_eq!(receipt.delivered(), 2);
        assert_eq!(receipt.failed(), 1);
    }
}
