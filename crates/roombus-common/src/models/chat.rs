//! ChatMessage — room and producer-note chat (§4.2 Chat).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_participant_id: Uuid,
    pub message_type: ChatMessageType,
    pub body: String,
    /// Set when the message is scoped to a single recipient (`chat:private`).
    pub for_participant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatMessageType {
    Chat,
    ProducerNote,
    System,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
    pub message_type: Option<ChatMessageType>,
    pub for_participant_id: Option<Uuid>,
}
