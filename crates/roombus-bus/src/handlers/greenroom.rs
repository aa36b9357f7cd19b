//! Green rooms (§4.2): sub-rooms that share the parent's IFB channel but are
//! never mixed into its program bus. Create/delete require HOST/MODERATOR;
//! the transient countdown/queue state has no Room field of its own (§3
//! lists no queue entity), so it lives only in [`BusState::greenroom_queues`]
//! for the lifetime of the process.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::room::{RoomType, RoomVisibility};

use crate::session::SessionState;
use crate::BusState;

async fn require_privileged(state: &BusState, session: &SessionState) -> Result<(), RoomBusError> {
    let participant_id = session.participant_id.ok_or(RoomBusError::Forbidden)?;
    let participant = roombus_db::repository::participants::find_by_id(&state.db.pool, participant_id)
        .await?
        .ok_or(RoomBusError::Forbidden)?;
    if !participant.role.is_privileged() {
        return Err(RoomBusError::Forbidden);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    name: String,
    capacity: Option<i32>,
}

pub async fn create(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let parent_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: CreateRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let created_by_id = session.user_id.or(session.participant_id).ok_or(RoomBusError::Forbidden)?;

    let room = roombus_db::repository::rooms::create_room(
        &state.db.pool,
        Uuid::now_v7(),
        &req.name,
        RoomVisibility::Private,
        None,
        req.capacity.unwrap_or(50),
        false,
        false,
        RoomType::GreenRoom,
        Some(parent_id),
        created_by_id,
        None,
    )
    .await?;

    state
        .hub
        .publish(RoomEvent::new("greenroom:created", RoomEvent::room_channel(parent_id), json!(room)))
        .await;
    Ok(json!(room))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomIdRequest {
    room_id: Uuid,
}

/// Migrates every connected participant back to the parent before removing
/// the row (§4.2 "Delete migrates all connected participants back to the
/// parent").
pub async fn delete(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let parent_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: RoomIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let room = roombus_db::repository::rooms::find_by_id(&state.db.pool, req.room_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("room {}", req.room_id) })?;
    if room.parent_id != Some(parent_id) {
        return Err(RoomBusError::Forbidden);
    }

    let connected = roombus_db::repository::participants::list_connected(&state.db.pool, room.id).await?;
    for participant in &connected {
        roombus_db::repository::participants::set_room(&state.db.pool, participant.id, parent_id).await?;
    }
    let errors = state.sfu.close_room(room.id).await;
    for err in errors {
        tracing::warn!(room = %room.id, error = %err, "error while closing green room SFU router");
    }
    roombus_db::repository::rooms::delete_room(&state.db.pool, room.id).await?;
    state.greenroom_queues.write().await.remove(&room.id);

    state
        .hub
        .publish(RoomEvent::new(
            "greenroom:deleted",
            RoomEvent::room_channel(parent_id),
            json!({ "roomId": room.id, "migratedParticipantIds": connected.iter().map(|p| p.id).collect::<Vec<_>>() }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn list(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let parent_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let rooms = roombus_db::repository::rooms::list_children(&state.db.pool, parent_id).await?;
    Ok(json!({ "rooms": rooms }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveParticipantRequest {
    participant_id: Uuid,
    destination_room_id: Uuid,
}

/// Updates `Participant.roomId` and emits `greenroom:participant-moved` to
/// source, destination, and (when they differ from both) the parent room
/// (§4.2).
pub async fn move_participant(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let current_room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: MoveParticipantRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let participant = roombus_db::repository::participants::find_by_id(&state.db.pool, req.participant_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("participant {}", req.participant_id) })?;
    let source_room_id = participant.room_id;

    roombus_db::repository::participants::set_room(&state.db.pool, req.participant_id, req.destination_room_id).await?;

    let payload = json!({
        "participantId": req.participant_id,
        "sourceRoomId": source_room_id,
        "destinationRoomId": req.destination_room_id,
    });

    let mut notified = std::collections::HashSet::new();
    for room_id in [source_room_id, req.destination_room_id, current_room_id] {
        if notified.insert(room_id) {
            state
                .hub
                .publish(RoomEvent::new("greenroom:participant-moved", RoomEvent::room_channel(room_id), payload.clone()))
                .await;
        }
    }
    Ok(payload)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateQueueRequest {
    room_id: Uuid,
    queue: serde_json::Value,
}

pub async fn update_queue(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let parent_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: UpdateQueueRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state.greenroom_queues.write().await.insert(req.room_id, req.queue.clone());
    state
        .hub
        .publish(RoomEvent::new(
            "greenroom:queue-updated",
            RoomEvent::room_channel(parent_id),
            json!({ "roomId": req.room_id, "queue": req.queue }),
        ))
        .await;
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountdownRequest {
    room_id: Uuid,
    seconds: i64,
}

pub async fn countdown(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let parent_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: CountdownRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state
        .hub
        .publish(RoomEvent::new(
            "greenroom:countdown",
            RoomEvent::room_channel(req.room_id),
            json!({ "roomId": req.room_id, "seconds": req.seconds }),
        ))
        .await;
    if req.room_id != parent_id {
        state
            .hub
            .publish(RoomEvent::new(
                "greenroom:countdown",
                RoomEvent::room_channel(parent_id),
                json!({ "roomId": req.room_id, "seconds": req.seconds }),
            ))
            .await;
    }
    Ok(json!({}))
}

pub async fn get_queue(state: &BusState, _session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let req: RoomIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let queue = state.greenroom_queues.read().await.get(&req.room_id).cloned().unwrap_or(json!([]));
    Ok(json!({ "roomId": req.room_id, "queue": queue }))
}
