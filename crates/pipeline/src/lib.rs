//! Message-created fan-out pipeline.
//!
//! Reacts to creation of a chat message and pushes a notification to every
//! other participant of the chat:
//!
//! 1. `RecipientResolver` loads the chat and produces participants minus
//!    sender
//! 2. `Dispatcher` resolves each recipient to device tokens across the
//!    candidate profile collections and makes one batch transport call
//!
//! Absent chat, empty recipient set, and empty token list all terminate the
//! pipeline as successful no-ops; only infrastructure faults (a broken read)
//! surface as errors. Transport failures are logged and swallowed.

pub mod dispatcher;
pub mod resolver;

use std::sync::Arc;

use courier_common::error::CourierError;
use courier_common::types::{DeliveryOutcome, MessageCreated, MessageRecord};
use courier_store::DocumentStore;
use courier_transport::PushTransport;

pub use dispatcher::Dispatcher;
pub use resolver::RecipientResolver;

/// The pipeline with its collaborators bound explicitly.
///
/// Store and transport are injected at construction rather than reached for
/// as process-wide globals, so tests can substitute in-memory fakes.
pub struct Pipeline {
    resolver: RecipientResolver,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn new(store: Arc<dyn DocumentStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            resolver: RecipientResolver::new(store.clone()),
            dispatcher: Dispatcher::new(store, transport),
        }
    }

    /// Run the full pipeline for one message-created event.
    pub async fn handle_message_created(
        &self,
        event: &MessageCreated,
    ) -> Result<DeliveryOutcome, CourierError> {
        let message: MessageRecord =
            serde_json::from_value(event.message.clone()).unwrap_or_else(|e| {
                tracing::warn!(
                    chat_id = %event.chat_id,
                    message_id = %event.message_id,
                    error = %e,
                    "Message record has unexpected shape"
                );
                MessageRecord::default()
            });

        let outcome = match self.resolver.resolve(&event.chat_id, &message).await? {
            None => DeliveryOutcome::ChatNotFound,
            Some(recipients) if recipients.is_empty() => DeliveryOutcome::NoRecipients,
            Some(recipients) => {
                self.dispatcher
                    .dispatch(&recipients, &message, &event.chat_id, &event.message_id)
                    .await?
            }
        };

        tracing::info!(
            chat_id = %event.chat_id,
            message_id = %event.message_id,
            outcome = %outcome,
            "Pipeline completed"
        );

        Ok(outcome)
    }
}
