//! Read interface over the document store holding chat, message, and profile
//! records.
//!
//! The pipeline only ever reads: `get(collection, id)` is the whole contract.
//! The trait exists so tests can substitute an in-memory store for the
//! Postgres-backed one.

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use courier_common::error::CourierError;

pub use postgres::PgDocumentStore;

/// Collection holding chat records, keyed by chat id.
pub const CHATS_COLLECTION: &str = "chats";

/// Candidate profile collections, in fixed priority order. A profile lookup
/// tries `clients` first and falls back to `coaches`.
pub const PROFILE_COLLECTIONS: [&str; 2] = ["clients", "coaches"];

/// Read-only access to the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document by collection and id.
    ///
    /// `Ok(None)` means the document does not exist; errors are reserved for
    /// failures of the read itself.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, CourierError>;
}

/// Look up a document across candidate collections in priority order,
/// stopping at the first hit.
pub async fn lookup_first(
    store: &dyn DocumentStore,
    collections: &[&str],
    id: &str,
) -> Result<Option<Value>, CourierError> {
    for &collection in collections {
        if let Some(doc) = store.get(collection, id).await? {
            tracing::debug!(collection, id, "Document found");
            return Ok(Some(doc));
        }
    }
    Ok(None)
}
