//! Mix coordinator bridge (§4.2, §4.3): thin delegates to
//! [`roombus_mixer::MixCoordinator`] using the session's `participantId` as
//! the mixer `clientId`. Errors convert through `MixerError`'s
//! `From<MixerError> for RoomBusError` impl.

use serde::Deserialize;
use serde_json::json;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::mix_state::{ChannelId, MixChangeType, MixStateChange};

use crate::session::SessionState;
use crate::BusState;

fn client_id(session: &SessionState) -> Result<uuid::Uuid, RoomBusError> {
    session.participant_id.ok_or(RoomBusError::Forbidden)
}

/// Re-reads the Participant row rather than trusting the cached session
/// role (§4.2 "Per-role authorization"; "register as primary mixer" is on
/// the privileged-action list).
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

pub async fn register(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let client = client_id(session)?;
    require_privileged(state, session).await?;
    state.mixer.init_room(room_id).await;
    state.mixer.register_primary_client(room_id, client).await?;

    let mix_state = state.mixer.get_state(room_id).await;
    state
        .hub
        .publish(RoomEvent::new(
            "mix:registered",
            RoomEvent::room_channel(room_id),
            json!({ "primaryClientId": client, "state": mix_state }),
        ))
        .await;
    Ok(json!({ "state": mix_state }))
}

pub async fn heartbeat(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let client = client_id(session)?;
    state.mixer.heartbeat(room_id, client).await?;
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateChangeRequest {
    #[serde(rename = "type")]
    change_type: MixChangeType,
    channel_id: Option<ChannelId>,
    changes: serde_json::Value,
}

pub async fn state_change(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let client = client_id(session)?;
    let req: StateChangeRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let change = MixStateChange {
        change_type: req.change_type,
        channel_id: req.channel_id,
        changes: req.changes,
        timestamp: chrono::Utc::now(),
        client_id: client,
    };

    let new_state = state.mixer.apply_state_change(room_id, client, &change).await?;
    state
        .hub
        .publish(RoomEvent::new("mix:state-change", RoomEvent::room_channel(room_id), json!(new_state)))
        .await;
    Ok(json!(new_state))
}

pub async fn full_sync(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let client = client_id(session)?;
    let new_state = state.mixer.sync_full_state(room_id, client, data).await?;
    state
        .hub
        .publish(RoomEvent::new("mix:full-sync", RoomEvent::room_channel(room_id), json!(new_state)))
        .await;
    Ok(json!(new_state))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRequest {
    channel_id: ChannelId,
}

pub async fn add_channel(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: ChannelRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let new_state = state.mixer.add_channel(room_id, req.channel_id.clone()).await;
    state
        .hub
        .publish(RoomEvent::new(
            "mix:channel-added",
            RoomEvent::room_channel(room_id),
            json!({ "channelId": req.channel_id, "state": new_state }),
        ))
        .await;
    Ok(json!(new_state))
}

pub async fn remove_channel(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: ChannelRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let new_state = state.mixer.remove_channel(room_id, &req.channel_id).await;
    state
        .hub
        .publish(RoomEvent::new(
            "mix:channel-removed",
            RoomEvent::room_channel(room_id),
            json!({ "channelId": req.channel_id, "state": new_state }),
        ))
        .await;
    Ok(json!(new_state))
}

pub async fn get_state(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let mix_state = state.mixer.get_state(room_id).await;
    Ok(json!(mix_state))
}

pub async fn takeover(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let client = client_id(session)?;
    require_privileged(state, session).await?;
    let previous = state.mixer.takeover(room_id, client).await?;

    state
        .hub
        .publish(RoomEvent::new(
            "mix:takeover",
            RoomEvent::room_channel(room_id),
            json!({ "newPrimaryClientId": client, "previousClientId": previous }),
        ))
        .await;
    Ok(json!({ "previousClientId": previous }))
}

pub async fn persist(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    state.mixer.persist_state(&state.db, room_id).await?;
    Ok(json!({}))
}
