//! RoomTimer repository.

use roombus_common::models::timer::{RoomTimer, TimerKind};
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    label: &str,
    kind: TimerKind,
    duration_secs: Option<i64>,
) -> Result<RoomTimer, sqlx::Error> {
    let kind_str = format!("{kind:?}").to_uppercase();
    sqlx::query_as::<_, RoomTimer>(
        r#"
        INSERT INTO room_timers (
            id, room_id, label, kind, duration_secs, state, started_at, accumulated_secs, created_at
        )
        VALUES (?, ?, ?, ?, ?, 'STOPPED', NULL, 0, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(label)
    .bind(kind_str)
    .bind(duration_secs)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<RoomTimer>, sqlx::Error> {
    sqlx::query_as::<_, RoomTimer>("SELECT * FROM room_timers WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_for_room(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<RoomTimer>, sqlx::Error> {
    sqlx::query_as::<_, RoomTimer>("SELECT * FROM room_timers WHERE room_id = ?")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn start(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE room_timers SET state = 'RUNNING', started_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Pause, folding the elapsed running segment into `accumulated_secs` so a
/// later read doesn't need `started_at` to compute elapsed time (§4.2).
pub async fn pause(pool: &sqlx::AnyPool, id: Uuid, elapsed_secs: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE room_timers SET state = 'PAUSED', accumulated_secs = ?, started_at = NULL WHERE id = ?",
    )
    .bind(elapsed_secs)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn reset(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE room_timers SET state = 'STOPPED', started_at = NULL, accumulated_secs = 0 WHERE id = ?",
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_timers WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

