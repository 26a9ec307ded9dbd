//! Recipient resolver — maps a created message to the identities that should
//! be notified.
//!
//! For each triggering event:
//! 1. Load the chat record by id
//! 2. Normalize the participant list to identity strings (either on-disk
//!    representation)
//! 3. Exclude the sender's identity, when it can be resolved

use std::sync::Arc;

use courier_common::error::CourierError;
use courier_common::types::{ChatRecord, MessageRecord};
use courier_store::{CHATS_COLLECTION, DocumentStore};

pub struct RecipientResolver {
    store: Arc<dyn DocumentStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve the recipient identities for a message created under `chat_id`.
    ///
    /// Returns `None` when no chat record exists (logged, terminal success
    /// for the caller). Otherwise returns the participant identities minus
    /// the sender, in participant-list order. Missing data never surfaces as
    /// an error; only failures of the read itself do.
    pub async fn resolve(
        &self,
        chat_id: &str,
        message: &MessageRecord,
    ) -> Result<Option<Vec<String>>, CourierError> {
        let Some(doc) = self.store.get(CHATS_COLLECTION, chat_id).await? else {
            tracing::info!(chat_id, "Chat record not found, nothing to notify");
            return Ok(None);
        };

        let chat: ChatRecord = serde_json::from_value(doc).unwrap_or_else(|e| {
            tracing::warn!(chat_id, error = %e, "Chat record has unexpected shape");
            ChatRecord::default()
        });

        let sender = message.sender_identity();
        let recipients: Vec<String> = chat
            .participant_identities()
            .into_iter()
            .filter(|identity| sender.as_deref() != Some(identity.as_str()))
            .collect();

        if recipients.is_empty() {
            tracing::info!(chat_id, "No recipients after sender exclusion");
        }

        Ok(Some(recipients))
    }
}
