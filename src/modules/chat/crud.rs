use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

use crate::modules::chat::model::Turn;

const KEY_PREFIX: &str = "chat:history";
const HISTORY_TTL: u64 = 3600; // 1 hour; doubles as the session lifetime

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Backend(String),
    #[error("corrupt history entry: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Per-session conversation history, keyed by session id. Injected into the
/// handlers so tests can swap the Redis backend for the in-memory one.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the stored history, or an empty one for an unknown session.
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, StoreError>;
    async fn save(&self, session_id: &str, history: &[Turn]) -> Result<(), StoreError>;
    async fn clear(&self, session_id: &str) -> Result<(), StoreError>;
}

pub struct RedisHistoryStore {
    redis: ConnectionManager,
}

impl RedisHistoryStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(session_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, session_id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, StoreError> {
        let mut redis = self.redis.clone();
        let raw: Option<String> = redis.get(Self::key(session_id)).await?;

        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, session_id: &str, history: &[Turn]) -> Result<(), StoreError> {
        let json = serde_json::to_string(history)?;
        let mut redis = self.redis.clone();
        redis
            .set_ex::<_, _, ()>(Self::key(session_id), json, HISTORY_TTL)
            .await?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let mut redis = self.redis.clone();
        redis.del::<_, ()>(Self::key(session_id)).await?;
        Ok(())
    }
}

/// In-memory store used by the test suite. Lock is never held across an
/// await point.
#[derive(Default)]
pub struct MemoryHistoryStore {
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn save(&self, session_id: &str, history: &[Turn]) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session_id.to_string(), history.to_vec());
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);
        Ok(())
    }
}
