//! ChatMessage repository.

use roombus_common::models::chat::{ChatMessage, ChatMessageType};
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    sender_participant_id: Uuid,
    message_type: ChatMessageType,
    body: &str,
    for_participant_id: Option<Uuid>,
) -> Result<ChatMessage, sqlx::Error> {
    let type_str = format!("{message_type:?}").to_uppercase();
    sqlx::query_as::<_, ChatMessage>(
        r#"
        INSERT INTO chat_messages (
            id, room_id, sender_participant_id, message_type, body, for_participant_id, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(sender_participant_id.to_string())
    .bind(type_str)
    .bind(body)
    .bind(for_participant_id.map(|u| u.to_string()))
    .fetch_one(pool)
    .await
}

pub async fn history(
    pool: &sqlx::AnyPool,
    room_id: Uuid,
    limit: i64,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM chat_messages WHERE room_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(room_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
}
