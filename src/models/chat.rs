// src/models/chat.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'chats' table in the database.
/// The message log itself lives in the external key-value store.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartChatRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub other_user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    pub chat_id: String,
    #[validate(length(min = 1))]
    pub sender_id: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// A single direct message as stored in (and read back from) the
/// key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_id: String,
    pub sender_id: String,
    pub content: String,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}
