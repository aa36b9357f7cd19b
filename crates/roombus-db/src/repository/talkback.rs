//! TalkbackGroup repository.

use roombus_common::models::talkback::{TalkbackGroup, TalkbackGroupMember};
use uuid::Uuid;

pub async fn create_group(pool: &sqlx::AnyPool, id: Uuid, room_id: Uuid, name: &str) -> Result<TalkbackGroup, sqlx::Error> {
    sqlx::query_as::<_, TalkbackGroup>(
        "INSERT INTO talkback_groups (id, room_id, name, created_at) VALUES (?, ?, ?, CURRENT_TIMESTAMP) RETURNING *",
    )
    .bind(id.to_string())
    .bind(room_id.to_string())
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn rename_group(pool: &sqlx::AnyPool, id: Uuid, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE talkback_groups SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_group(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM talkback_groups WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_groups(pool: &sqlx::AnyPool, room_id: Uuid) -> Result<Vec<TalkbackGroup>, sqlx::Error> {
    sqlx::query_as::<_, TalkbackGroup>("SELECT * FROM talkback_groups WHERE room_id = ?")
        .bind(room_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn add_member(pool: &sqlx::AnyPool, group_id: Uuid, participant_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO talkback_group_members (group_id, participant_id) VALUES (?, ?)")
        .bind(group_id.to_string())
        .bind(participant_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_member(pool: &sqlx::AnyPool, group_id: Uuid, participant_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM talkback_group_members WHERE group_id = ? AND participant_id = ?")
        .bind(group_id.to_string())
        .bind(participant_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn members(pool: &sqlx::AnyPool, group_id: Uuid) -> Result<Vec<TalkbackGroupMember>, sqlx::Error> {
    sqlx::query_as::<_, TalkbackGroupMember>("SELECT * FROM talkback_group_members WHERE group_id = ?")
        .bind(group_id.to_string())
        .fetch_all(pool)
        .await
}
