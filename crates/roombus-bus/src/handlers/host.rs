//! Host control (§4.2): privileged actions requiring HOST or MODERATOR.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;

use crate::session::SessionState;
use crate::BusState;

/// Re-reads the Participant row rather than trusting the cached session
/// role (§4.2 "Per-role authorization").
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
struct TargetRequest {
    participant_id: Uuid,
}

pub async fn kick(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: TargetRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let _ = state.sfu.close_participant(room_id, req.participant_id).await;
    roombus_db::repository::participants::mark_disconnected(&state.db.pool, req.participant_id).await?;

    let room_channel = RoomEvent::room_channel(room_id);
    state
        .hub
        .publish(RoomEvent::new("host:kick", room_channel.clone(), json!({})).targeted(vec![req.participant_id]))
        .await;
    state
        .hub
        .publish(RoomEvent::new("room:participant-left", room_channel, json!({ "participantId": req.participant_id })))
        .await;
    Ok(json!({}))
}

pub async fn close_room(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;

    roombus_db::repository::rooms::set_active(&state.db.pool, room_id, false).await?;
    let errors = state.sfu.close_room(room_id).await;
    for err in errors {
        tracing::warn!(room = %room_id, error = %err, "error while closing SFU room");
    }
    state
        .hub
        .publish(RoomEvent::new("room:closed", RoomEvent::room_channel(room_id), json!({})))
        .await;
    Ok(json!({}))
}

pub async fn admit(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: TargetRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let participant = roombus_db::repository::participants::find_by_id(&state.db.pool, req.participant_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("participant {}", req.participant_id) })?;

    roombus_db::repository::participants::admit(&state.db.pool, req.participant_id).await?;
    state.sfu.get_or_create_room(room_id).await?;
    state
        .sfu
        .add_participant(room_id, req.participant_id, participant.display_name.clone())
        .await?;
    let rtp_capabilities = state.sfu.rtp_capabilities(room_id).await?;
    let producers = state.sfu.get_producers_in_room(room_id, Some(req.participant_id)).await?;

    state
        .hub
        .publish(
            RoomEvent::new(
                "room:admitted",
                RoomEvent::room_channel(room_id),
                json!({
                    "rtpCapabilities": rtp_capabilities,
                    "iceServers": crate::ice_servers(),
                    "producers": producers.into_iter().map(|(owner, producer)| json!({ "participantId": owner, "producerId": producer })).collect::<Vec<_>>(),
                }),
            )
            .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({}))
}

pub async fn reject(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: TargetRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    roombus_db::repository::participants::reject(&state.db.pool, req.participant_id).await?;
    state
        .hub
        .publish(RoomEvent::new("host:reject", RoomEvent::room_channel(room_id), json!({})).targeted(vec![req.participant_id]))
        .await;
    Ok(json!({}))
}
