use redis::aio::ConnectionManager;
use std::env;
use tracing::info;

pub async fn connect() -> ConnectionManager {
    let uri = env::var("REDIS_URI").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let client = redis::Client::open(uri).expect("Failed to create Redis client");

    let manager = ConnectionManager::new(client)
        .await
        .expect("Failed to connect to Redis");

    info!("connected to Redis");
    manager
}
