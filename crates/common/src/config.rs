use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string for the document store
    pub database_url: String,

    /// Redis connection string (trigger event queue)
    pub redis_url: String,

    /// Redis list key the trigger listens on for message-created events
    pub message_queue_key: String,

    /// Push transport batch-send endpoint
    pub push_endpoint_url: String,

    /// Server key sent in the push transport Authorization header
    pub push_server_key: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            message_queue_key: std::env::var("MESSAGE_QUEUE_KEY")
                .unwrap_or_else(|_| "courier:message-created".to_string()),
            push_endpoint_url: std::env::var("PUSH_ENDPOINT_URL")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".to_string()),
            push_server_key: std::env::var("PUSH_SERVER_KEY")
                .map_err(|_| anyhow::anyhow!("PUSH_SERVER_KEY environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }
}
