//! WHIPStream repository.

use roombus_common::models::whip::{WhipStream, WhipState};
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    audio_source_id: Uuid,
    bearer_token: &str,
) -> Result<WhipStream, sqlx::Error> {
    sqlx::query_as::<_, WhipStream>(
        r#"
        INSERT INTO whip_streams (id, room_id, audio_source_id, bearer_token, state, resource_url, created_at)
        VALUES (?, ?, ?, ?, 'PENDING', NULL, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(audio_source_id.to_string())
    .bind(bearer_token)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<WhipStream>, sqlx::Error> {
    sqlx::query_as::<_, WhipStream>("SELECT * FROM whip_streams WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn set_state(pool: &sqlx::AnyPool, id: Uuid, state: WhipState, resource_url: Option<&str>) -> Result<(), sqlx::Error> {
    let state_str = format!("{state:?}").to_uppercase();
    sqlx::query("UPDATE whip_streams SET state = ?, resource_url = COALESCE(?, resource_url) WHERE id = ?")
        .bind(state_str)
        .bind(resource_url)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM whip_streams WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
