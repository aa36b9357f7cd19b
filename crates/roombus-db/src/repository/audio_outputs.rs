//! AudioOutput repository.

use roombus_common::models::audio_output::{AudioCodec, AudioOutput, AudioOutputConfig};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn create(
    pool: &sqlx::AnyPool,
    id: Uuid,
    room_id: Uuid,
    config: &AudioOutputConfig,
    codec: AudioCodec,
    bitrate_kbps: i32,
    sample_rate: i32,
    channels: i16,
    bus_routing: &HashMap<String, f32>,
) -> Result<AudioOutput, sqlx::Error> {
    let config_json = serde_json::to_string(config).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let routing_json =
        serde_json::to_string(bus_routing).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let codec_str = format!("{codec:?}").to_lowercase();

    sqlx::query_as::<_, AudioOutput>(
        r#"
        INSERT INTO audio_outputs (
            id, room_id, config, codec, bitrate_kbps, sample_rate, channels, bus_routing,
            is_enabled, is_active, is_connected, error_message, connected_at, bytes_streamed,
            retry_count, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, true, false, false, NULL, NULL, 0, 0, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(config_json)
    .bind(codec_str)
    .bind(bitrate_kbps)
    .bind(sample_rate)
    .bind(channels)
    .bind(routing_json)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<AudioOutput>, sqlx::Error> {
    sqlx::query_as::<_, AudioOutput>("SELECT * FROM audio_outputs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_for_room(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<AudioOutput>, sqlx::Error> {
    sqlx::query_as::<_, AudioOutput>("SELECT * FROM audio_outputs WHERE room_id = ?")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn update_bus_routing(
    pool: &sqlx::AnyPool,
    id: Uuid,
    bus_routing: &HashMap<String, f32>,
) -> Result<(), sqlx::Error> {
    let routing_json =
        serde_json::to_string(bus_routing).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query("UPDATE audio_outputs SET bus_routing = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(routing_json)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_connection_state(
    pool: &sqlx::AnyPool,
    id: Uuid,
    is_active: bool,
    is_connected: bool,
    error_message: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE audio_outputs SET is_active = ?, is_connected = ?, error_message = ?, \
         connected_at = CASE WHEN ? THEN CURRENT_TIMESTAMP ELSE connected_at END, \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(is_active)
    .bind(is_connected)
    .bind(error_message)
    .bind(is_connected)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_retry(pool: &sqlx::AnyPool, id: Uuid, retry_count: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE audio_outputs SET retry_count = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(retry_count)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_bytes_streamed(pool: &sqlx::AnyPool, id: Uuid, bytes: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE audio_outputs SET bytes_streamed = bytes_streamed + ? WHERE id = ?")
        .bind(bytes)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
