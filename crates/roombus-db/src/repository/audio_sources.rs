//! AudioSource repository.

use roombus_common::models::audio_source::{AudioSource, AudioSourceConfig, ConnectionState, PlaybackState};
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    config: &AudioSourceConfig,
) -> Result<AudioSource, sqlx::Error> {
    let config_json = serde_json::to_string(config).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query_as::<_, AudioSource>(
        r#"
        INSERT INTO audio_sources (
            id, room_id, config, playback_state, connection_state, error_message,
            listener_port, remote_address, created_at, updated_at
        )
        VALUES (?, ?, ?, 'STOPPED', 'IDLE', NULL, NULL, NULL, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(config_json)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<AudioSource>, sqlx::Error> {
    sqlx::query_as::<_, AudioSource>("SELECT * FROM audio_sources WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_for_room(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<AudioSource>, sqlx::Error> {
    sqlx::query_as::<_, AudioSource>("SELECT * FROM audio_sources WHERE room_id = ?")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}

/// List every source currently holding a listener port, so the ingest
/// supervisor's port allocator can skip ones already taken (§4.5, §8).
pub async fn list_allocated_ports(pool: &sqlx::AnyPool) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT listener_port FROM audio_sources WHERE listener_port IS NOT NULL \
         AND connection_state != 'DISCONNECTED'",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(p,)| p).collect())
}

pub async fn set_connection_state(
    pool: &sqlx::AnyPool,
    id: Uuid,
    state: ConnectionState,
    error_message: Option<&str>,
) -> Result<(), sqlx::Error> {
    let state_str = format!("{state:?}").to_uppercase();
    sqlx::query(
        "UPDATE audio_sources SET connection_state = ?, error_message = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?",
    )
    .bind(state_str)
    .bind(error_message)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_playback_state(
    pool: &sqlx::AnyPool,
    id: Uuid,
    state: PlaybackState,
) -> Result<(), sqlx::Error> {
    let state_str = format!("{state:?}").to_uppercase();
    sqlx::query("UPDATE audio_sources SET playback_state = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(state_str)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn allocate_port(
    pool: &sqlx::AnyPool,
    id: Uuid,
    port: u16,
    remote_address: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE audio_sources SET listener_port = ?, remote_address = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?",
    )
    .bind(port as i64)
    .bind(remote_address)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn release_port(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE audio_sources SET listener_port = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
