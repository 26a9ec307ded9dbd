use thiserror::Error;

/// Common error types used across the application.
///
/// Absence of data (missing chat, missing profile) is never represented here;
/// those cases degrade to empty results inside the pipeline. Only genuine
/// infrastructure faults surface as errors.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
