//! Token aggregator & dispatcher — turns a recipient set into one batch send.
//!
//! For each recipient:
//! 1. Look up their profile across the candidate collections in priority
//!    order (`clients`, then `coaches`); absent from both means skip
//! 2. Append the profile's device tokens to one aggregate list
//!
//! Then build the payload and hand the full token list to the transport in a
//! single call. A transport failure is logged and swallowed; there is no
//! retry, so delivery is best-effort by design.

use std::sync::Arc;

use courier_common::error::CourierError;
use courier_common::types::{DeliveryOutcome, MessageRecord, NotificationPayload, ProfileRecord};
use courier_store::{DocumentStore, PROFILE_COLLECTIONS, lookup_first};
use courier_transport::PushTransport;

pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    transport: Arc<dyn PushTransport>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self { store, transport }
    }

    /// Aggregate the recipients' device tokens and send the notification.
    ///
    /// The caller short-circuits before invoking this with no recipients,
    /// but an empty input is tolerated here too and reported as a no-op.
    /// Profile-lookup failures at the storage layer propagate; a transport
    /// failure does not.
    pub async fn dispatch(
        &self,
        recipients: &[String],
        message: &MessageRecord,
        chat_id: &str,
        message_id: &str,
    ) -> Result<DeliveryOutcome, CourierError> {
        if recipients.is_empty() {
            tracing::debug!(chat_id, message_id, "Dispatch invoked with no recipients");
            return Ok(DeliveryOutcome::NoRecipients);
        }

        let mut tokens: Vec<String> = Vec::new();
        for identity in recipients {
            let Some(doc) =
                lookup_first(self.store.as_ref(), &PROFILE_COLLECTIONS, identity).await?
            else {
                tracing::debug!(identity = %identity, "No profile record in any collection, skipping");
                continue;
            };

            let profile: ProfileRecord = serde_json::from_value(doc).unwrap_or_else(|e| {
                tracing::warn!(identity = %identity, error = %e, "Profile record has unexpected shape");
                ProfileRecord::default()
            });

            // Duplicates are preserved: the same token in several profiles
            // gets one send per appearance.
            tokens.extend(profile.device_tokens);
        }

        if tokens.is_empty() {
            tracing::info!(
                chat_id,
                message_id,
                recipients = recipients.len(),
                "No device tokens registered for any recipient"
            );
            return Ok(DeliveryOutcome::NoTokens);
        }

        let payload = NotificationPayload::for_message(message, chat_id, message_id);

        match self.transport.send_batch(&tokens, &payload).await {
            Ok(receipt) => {
                let delivered = receipt.delivered();
                let failed = receipt.failed();
                tracing::info!(
                    chat_id,
                    message_id,
                    tokens = tokens.len(),
                    delivered,
                    failed,
                    "Notification batch sent"
                );
                Ok(DeliveryOutcome::Delivered { delivered, failed })
            }
            Err(e) => {
                // Best-effort delivery: no retry policy exists, so the
                // triggering event must not be failed for a transport fault.
                tracing::error!(chat_id, message_id, error = %e, "Batch send failed");
                Ok(DeliveryOutcome::TransportFailed)
            }
        }
    }
}
