//! RoomCue repository.

use roombus_common::models::cue::RoomCue;
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    sent_by_id: Uuid,
    label: &str,
    color: Option<&str>,
    target_participant_id: Option<Uuid>,
) -> Result<RoomCue, sqlx::Error> {
    sqlx::query_as::<_, RoomCue>(
        r#"
        INSERT INTO room_cues (id, room_id, sent_by_id, label, color, target_participant_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(sent_by_id.to_string())
    .bind(label)
    .bind(color)
    .bind(target_participant_id.map(|u| u.to_string()))
    .fetch_one(pool)
    .await
}

pub async fn clear(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_cues WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_for_room(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<RoomCue>, sqlx::Error> {
    sqlx::query_as::<_, RoomCue>("SELECT * FROM room_cues WHERE room_id = ? ORDER BY created_at")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}
