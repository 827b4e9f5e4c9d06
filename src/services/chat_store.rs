//! Chat-message store boundary.
//!
//! Direct messages are not persisted in Postgres; they live in an external
//! key-value store with list-append / range-read semantics, keyed per chat.
//! The Redis implementation is the production one; the in-memory store backs
//! tests and development without a Redis instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::AppError;

#[derive(Debug)]
pub enum ChatStoreError {
    Connection(String),
    Operation(String),
}

impl fmt::Display for ChatStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatStoreError::Connection(msg) => write!(f, "chat store connection: {}", msg),
            ChatStoreError::Operation(msg) => write!(f, "chat store operation: {}", msg),
        }
    }
}

impl std::error::Error for ChatStoreError {}

impl From<ChatStoreError> for AppError {
    fn from(err: ChatStoreError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Key for a chat's message list: the two participant ids, sorted, so both
/// directions of a conversation resolve to the same list.
pub fn chat_key(user_a: &str, user_b: &str) -> String {
    let mut ids = [user_a, user_b];
    ids.sort_unstable();
    format!("chat:{}:{}", ids[0], ids[1])
}

#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    /// Append a serialized message to the chat's list.
    async fn append(&self, key: &str, message: &str) -> Result<(), ChatStoreError>;

    /// Full message history, oldest first.
    async fn history(&self, key: &str) -> Result<Vec<String>, ChatStoreError>;
}

/// Redis-backed store. LPUSH prepends, so reads reverse the range to get
/// chronological order.
pub struct RedisChatStore {
    conn: ConnectionManager,
}

impl RedisChatStore {
    pub async fn connect(url: &str) -> Result<Self, ChatStoreError> {
        let client =
            redis::Client::open(url).map_err(|e| ChatStoreError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| ChatStoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| ChatStoreError::Connection(e.to_string()))?;

        tracing::info!("Connected to Redis chat store");

        Ok(Self { conn })
    }
}

#[async_trait]
impl ChatMessageStore for RedisChatStore {
    async fn append(&self, key: &str, message: &str) -> Result<(), ChatStoreError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(key, message)
            .await
            .map_err(|e| ChatStoreError::Operation(e.to_string()))
    }

    async fn history(&self, key: &str) -> Result<Vec<String>, ChatStoreError> {
        let mut conn = self.conn.clone();
        let mut messages: Vec<String> = conn
            .lrange(key, 0, -1)
            .await
            .map_err(|e| ChatStoreError::Operation(e.to_string()))?;
        messages.reverse();
        Ok(messages)
    }
}

/// In-memory store for tests and Redis-less development.
#[derive(Default)]
pub struct MemoryChatStore {
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatMessageStore for MemoryChatStore {
    async fn append(&self, key: &str, message: &str) -> Result<(), ChatStoreError> {
        let mut lists = self
            .lists
            .lock()
            .map_err(|e| ChatStoreError::Operation(e.to_string()))?;
        lists.entry(key.to_string()).or_default().push(message.to_string());
        Ok(())
    }

    async fn history(&self, key: &str) -> Result<Vec<String>, ChatStoreError> {
        let lists = self
            .lists
            .lock()
            .map_err(|e| ChatStoreError::Operation(e.to_string()))?;
        Ok(lists.get(key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_key_is_direction_independent() {
        assert_eq!(chat_key("alice", "bob"), chat_key("bob", "alice"));
        assert_eq!(chat_key("alice", "bob"), "chat:alice:bob");
    }

    #[tokio::test]
    async fn memory_store_preserves_order() {
        let store = MemoryChatStore::new();
        store.append("chat:a:b", "first").await.unwrap();
        store.append("chat:a:b", "second").await.unwrap();

        let history = store.history("chat:a:b").await.unwrap();
        assert_eq!(history, vec!["first", "second"]);
        assert!(store.history("chat:x:y").await.unwrap().is_empty());
    }
}
