//! Participant repository.

use roombus_common::models::participant::Participant;
use roombus_common::permissions::ParticipantRole;
use uuid::Uuid;

pub async fn create_participant(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    user_id: Option<Uuid>,
    display_name: &str,
    role: ParticipantRole,
    is_in_waiting_room: bool,
) -> Result<Participant, sqlx::Error> {
    sqlx::query_as::<_, Participant>(
        r#"
        INSERT INTO participants (
            id, room_id, user_id, display_name, role, is_connected, is_speaking,
            is_muted, is_in_waiting_room, joined_at, left_at
        )
        VALUES (?, ?, ?, ?, ?, true, false, false, ?, CURRENT_TIMESTAMP, NULL)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(user_id.map(|u| u.to_string()))
    .bind(display_name)
    .bind(role.to_string())
    .bind(is_in_waiting_room)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<Participant>, sqlx::Error> {
    sqlx::query_as::<_, Participant>("SELECT * FROM participants WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Count *connected* participants in a room — the capacity check always
/// reads this live rather than trusting a cached counter (§4.2).
pub async fn count_connected(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM participants WHERE room_id = ? AND is_connected = true")
            .bind(room_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn list_connected(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<Participant>, sqlx::Error> {
    sqlx::query_as::<_, Participant>(
        "SELECT * FROM participants WHERE room_id = ? AND is_connected = true ORDER BY joined_at",
    )
    .bind(room_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn set_role(pool: &sqlx::AnyPool, id: Uuid, role: ParticipantRole) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET role = ? WHERE id = ?")
        .bind(role.to_string())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_room(pool: &sqlx::AnyPool, id: Uuid, room_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET room_id = ? WHERE id = ?")
        .bind(room_id.to_string())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn admit(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET is_in_waiting_room = false WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_speaking(pool: &sqlx::AnyPool, id: Uuid, is_speaking: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET is_speaking = ? WHERE id = ?")
        .bind(is_speaking)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_muted(pool: &sqlx::AnyPool, id: Uuid, is_muted: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET is_muted = ? WHERE id = ?")
        .bind(is_muted)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark disconnected. Safe to call twice — a racing explicit `room:leave`
/// and transport-close callback both converge on the same terminal row (§5).
pub async fn mark_disconnected(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE participants SET is_connected = false, left_at = CURRENT_TIMESTAMP \
         WHERE id = ? AND is_connected = true",
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn reject(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    mark_disconnected(pool, id).await
}
