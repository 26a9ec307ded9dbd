use std::sync::Arc;

use courier_common::config::AppConfig;
use courier_common::{db, redis_pool};
use courier_pipeline::Pipeline;
use courier_store::PgDocumentStore;
use courier_transport::HttpPushTransport;
use courier_trigger::listener::{MessageListener, RedisEventQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_trigger=info,courier_pipeline=debug".into()),
        )
        .json()
        .init();

    tracing::info!("MessageCourier trigger starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to the document store
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Connect to the trigger queue
    let redis = redis_pool::create_redis_pool(&config.redis_url).await?;

    // Wire the pipeline with its collaborators
    let store = Arc::new(PgDocumentStore::new(pool));
    let transport = Arc::new(HttpPushTransport::new(
        config.push_endpoint_url.clone(),
        config.push_server_key.clone(),
    ));
    let pipeline = Pipeline::new(store, transport);

    let queue = RedisEventQueue::new(redis, config.message_queue_key.clone());
    let mut listener = MessageListener::new(queue, pipeline);

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = listener.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Message listener exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("MessageCourier trigger stopped.");
    Ok(())
}
