//! Recording repository.

use roombus_common::models::recording::Recording;
use uuid::Uuid;

pub async fn start(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    started_by_id: Uuid,
) -> Result<Recording, sqlx::Error> {
    sqlx::query_as::<_, Recording>(
        r#"
        INSERT INTO recordings (id, room_id, started_by_id, state, file_path, duration_secs, started_at, ended_at)
        VALUES (?, ?, ?, 'RECORDING', NULL, NULL, CURRENT_TIMESTAMP, NULL)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(started_by_id.to_string())
    .fetch_one(pool)
    .await
}

/// `RECORDING → PROCESSING`, with the computed duration (§4.2 Recording).
pub async fn stop(pool: &sqlx::AnyPool, id: Uuid, duration_secs: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE recordings SET state = 'PROCESSING', duration_secs = ?, ended_at = CURRENT_TIMESTAMP \
         WHERE id = ?",
    )
    .bind(duration_secs)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_complete(pool: &sqlx::AnyPool, id: Uuid, file_path: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE recordings SET state = 'COMPLETE', file_path = ? WHERE id = ?")
        .bind(file_path)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_for_room(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<Recording>, sqlx::Error> {
    sqlx::query_as::<_, Recording>("SELECT * FROM recordings WHERE room_id = ? ORDER BY started_at DESC")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}
