use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pm_advisor::modules::chat::crud::{HistoryStore, RedisHistoryStore};
use pm_advisor::services::llm::{CompletionApi, LlmClient};
use pm_advisor::{config, modules, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let redis = config::redis::connect().await;
    let store: Arc<dyn HistoryStore> = Arc::new(RedisHistoryStore::new(redis));

    // The service still comes up without a key; /chat degrades to a fixed
    // error and /health reports the gap.
    let llm: Option<Arc<dyn CompletionApi>> = match LlmClient::new() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("completion client unavailable: {}", e);
            None
        }
    };

    let state = AppState { store, llm };

    let app = Router::new()
        .merge(modules::chat::routes::routes())
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("listening on {}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
