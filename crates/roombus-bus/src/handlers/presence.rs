//! Presence (§4.2): broadcast to room; `vad`/`mute` are also persisted on
//! the Participant row.

use serde::Deserialize;
use serde_json::json;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;

use crate::session::SessionState;
use crate::BusState;

#[derive(Debug, Deserialize)]
struct SpeakingRequest {
    speaking: bool,
}

pub async fn vad_speaking(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        return Err(RoomBusError::Forbidden);
    };
    let req: SpeakingRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    roombus_db::repository::participants::set_speaking(&state.db.pool, participant_id, req.speaking).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "vad:speaking",
            RoomEvent::room_channel(room_id),
            json!({ "participantId": participant_id, "speaking": req.speaking }),
        ))
        .await;
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
struct MuteRequest {
    muted: bool,
}

pub async fn mute_update(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        return Err(RoomBusError::Forbidden);
    };
    let req: MuteRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    roombus_db::repository::participants::set_muted(&state.db.pool, participant_id, req.muted).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "mute:update",
            RoomEvent::room_channel(room_id),
            json!({ "participantId": participant_id, "muted": req.muted }),
        ))
        .await;
    Ok(json!({}))
}

/// Tally lights carry no persisted state — they're a live on-air indicator,
/// not a Participant field (§4.2 lists no persistence for `tally:update`).
pub async fn tally_update(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        return Err(RoomBusError::Forbidden);
    };
    state
        .hub
        .publish(RoomEvent::new(
            "tally:update",
            RoomEvent::room_channel(room_id),
            json!({ "participantId": participant_id, "tally": data }),
        ))
        .await;
    Ok(json!({}))
}
