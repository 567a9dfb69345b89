use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub request_id: i64,
    pub sender_id: Uuid,
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}

/// A chat message joined with its sender's username, the shape the
/// request-details view renders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessageView {
    pub id: i64,
    pub request_id: i64,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}
