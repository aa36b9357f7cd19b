//! Rundown + RundownItem repository.

use roombus_common::models::rundown::{Rundown, RundownItem};
use uuid::Uuid;

pub async fn create_rundown(pool: &sqlx::AnyPool, id: Uuid, room_id: Uuid, name: &str) -> Result<Rundown, sqlx::Error> {
    sqlx::query_as::<_, Rundown>(
        "INSERT INTO rundowns (id, room_id, name, created_at) VALUES (?, ?, ?, CURRENT_TIMESTAMP) RETURNING *",
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn list_items(pool: &sqlx::AnyPool, rundown_id: Uuid) -> Result<Vec<RundownItem>, sqlx::Error> {
    sqlx::query_as::<_, RundownItem>("SELECT * FROM rundown_items WHERE rundown_id = ? ORDER BY position")
        .bind(rundown_id.to_string())
        .fetch_all(pool)
        .await
}

/// Transactionally switch the current item: unset the previous current,
/// mark it completed with `actualEndAt=now`, and mark the new one current
/// with `actualStartAt=now` (§4.2 Rundown, §5).
pub async fn set_current(
    pool: &sqlx::AnyPool,
    rundown_id: Uuid,
    item_id: Uuid,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE rundown_items SET is_current = false, is_completed = true, actual_end_at = CURRENT_TIMESTAMP \
         WHERE rundown_id = ? AND is_current = true",
    )
    .bind(rundown_id.to_string())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE rundown_items SET is_current = true, actual_start_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(item_id.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
