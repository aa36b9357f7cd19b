//! Room repository.

use roombus_common::models::room::{Room, RoomType, RoomVisibility};
use uuid::Uuid;

#[allow(clippy::too_many_arguments)]
pub async fn create_room(
    pool: &sqlx::AnyPool,
    id: Uuid,
    name: &str,
    visibility: RoomVisibility,
    access_code: Option<&str>,
    capacity: i32,
    waiting_room: bool,
    recording_enabled: bool,
    room_type: RoomType,
    parent_id: Option<Uuid>,
    created_by_id: Uuid,
    organization_id: Option<Uuid>,
) -> Result<Room, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (
            id, name, visibility, access_code, invite_token, is_active, capacity,
            waiting_room, recording_enabled, room_type, parent_id, created_by_id,
            organization_id, mix_state, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, NULL, true, ?, ?, ?, ?, ?, ?, ?, '{}', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(format!("{visibility:?}").to_uppercase())
    .bind(access_code)
    .bind(capacity)
    .bind(waiting_room)
    .bind(recording_enabled)
    .bind(format!("{room_type:?}").to_uppercase())
    .bind(parent_id.map(|u| u.to_string()))
    .bind(created_by_id.to_string())
    .bind(organization_id.map(|u| u.to_string()))
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_children(pool: &sqlx::AnyPool, parent_id: Uuid) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE parent_id = ? ORDER BY created_at")
        .bind(parent_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn set_active(pool: &sqlx::AnyPool, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(is_active)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist the in-memory mix state snapshot (§4.3 `persistState`).
pub async fn persist_mix_state(
    pool: &sqlx::AnyPool,
    id: Uuid,
    mix_state: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET mix_state = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(mix_state.to_string())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_room(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
