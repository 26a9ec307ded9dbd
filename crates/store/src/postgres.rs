use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use courier_common::error::CourierError;

use crate::DocumentStore;

/// Postgres-backed document store.
///
/// Documents live in a single `documents` table keyed by `(collection, id)`
/// with the record body in a JSONB column, so heterogeneous record shapes
/// (structured references vs. plain strings) pass through untouched.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, CourierError> {
        let doc: Option<Value> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(doc)
    }
}
