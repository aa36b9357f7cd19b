//! IFBSession repository.

use roombus_common::models::ifb::{IfbSession, IfbTarget};
use uuid::Uuid;

pub async fn start(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    started_by_id: Uuid,
    target: &IfbTarget,
) -> Result<IfbSession, sqlx::Error> {
    let target_json = serde_json::to_string(target).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query_as::<_, IfbSession>(
        r#"
        INSERT INTO ifb_sessions (id, room_id, started_by_id, target, started_at, ended_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, NULL)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(started_by_id.to_string())
    .bind(target_json)
    .fetch_one(pool)
    .await
}

pub async fn end(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE ifb_sessions SET ended_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_active(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<IfbSession>, sqlx::Error> {
    sqlx::query_as::<_, IfbSession>("SELECT * FROM ifb_sessions WHERE room_id = ? AND ended_at IS NULL")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}
