// src/handlers/chats.rs

use axum::{Form, Json, extract::Path, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::fetch_user_by_id,
    models::chat::{Chat, ChatMessage, SendMessageRequest, StartChatRequest},
    services::chat_store::chat_key,
    state::AppState,
};

const CHAT_COLUMNS: &str = "id, user1_id, user2_id, started_at";

/// A chat row for a user pair, regardless of who started it.
async fn find_chat_between(
    pool: &PgPool,
    user_a: &str,
    user_b: &str,
) -> Result<Option<Chat>, AppError> {
    let chat = sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats \
         WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1) \
         LIMIT 1"
    ))
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    Ok(chat)
}

/// Start (or resume) a direct chat between two users.
/// At most one chat row exists per pair; starting again in either
/// direction returns the existing one.
pub async fn start_user_chat(
    State(state): State<AppState>,
    Form(payload): Form<StartChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user1 = fetch_user_by_id(&state.pool, &payload.user_id).await?;
    let user2 = fetch_user_by_id(&state.pool, &payload.other_user_id).await?;
    if user1.is_none() || user2.is_none() {
        return Err(AppError::NotFound("One or both users not found".to_string()));
    }

    if let Some(existing) =
        find_chat_between(&state.pool, &payload.user_id, &payload.other_user_id).await?
    {
        return Ok(Json(json!({
            "success": true,
            "chatId": existing.id,
            "chat": existing,
        })));
    }

    let chat_id = Uuid::new_v4().to_string();
    let chat = sqlx::query_as::<_, Chat>(&format!(
        "INSERT INTO chats (id, user1_id, user2_id) VALUES ($1, $2, $3) \
         RETURNING {CHAT_COLUMNS}"
    ))
    .bind(&chat_id)
    .bind(&payload.user_id)
    .bind(&payload.other_user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "chatId": chat_id,
        "chat": chat,
    })))
}

/// Append a message to a chat. The message log lives in the external
/// key-value store; Postgres only knows the chat exists.
pub async fn send_message(
    State(state): State<AppState>,
    Form(payload): Form<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let chat = sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"
    ))
    .bind(&payload.chat_id)
    .fetch_optional(&state.pool)
    .await?;

    let chat = match chat {
        Some(chat) if chat.has_participant(&payload.sender_id) => chat,
        // Absent and not-a-participant answer identically.
        _ => {
            return Err(AppError::NotFound(
                "Chat not found or unauthorized".to_string(),
            ));
        }
    };

    let message = ChatMessage {
        message_id: Uuid::new_v4().to_string(),
        sender_id: payload.sender_id,
        content: payload.content,
        sent_at: chrono::Utc::now(),
    };

    let key = chat_key(&chat.user1_id, &chat.user2_id);
    let serialized = serde_json::to_string(&message)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    state.chat_store.append(&key, &serialized).await?;

    Ok(Json(json!({
        "success": true,
        "messageId": message.message_id,
        "message": message,
    })))
}

/// Full message history between two users, oldest first (pull-based; no
/// push delivery).
pub async fn chat_history(
    State(state): State<AppState>,
    Path((user_id, other_user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let chat = find_chat_between(&state.pool, &user_id, &other_user_id)
        .await?
        .ok_or(AppError::NotFound("Chat not found".to_string()))?;

    let key = chat_key(&user_id, &other_user_id);
    let raw_messages = state.chat_store.history(&key).await?;

    let messages: Vec<ChatMessage> = raw_messages
        .iter()
        .filter_map(|raw| match serde_json::from_str(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("Skipping unparseable chat message: {}", e);
                None
            }
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "chatId": chat.id,
        "messages": messages,
    })))
}
