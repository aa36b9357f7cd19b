//! Cues (§4.2): create/delete RoomCue rows; broadcast `cue:received`/`cue:cleared`.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::cue::SendCueRequest;

use crate::session::SessionState;
use crate::BusState;

pub async fn send(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        return Err(RoomBusError::Forbidden);
    };
    let req: SendCueRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let cue = roombus_db::repository::cues::create(
        &state.db.pool,
        Uuid::now_v7(),
        room_id,
        participant_id,
        &req.label,
        req.color.as_deref(),
        req.target_participant_id,
    )
    .await?;

    let event = RoomEvent::new("cue:received", RoomEvent::room_channel(room_id), json!(cue));
    let event = match req.target_participant_id {
        Some(target) => event.targeted(vec![target]),
        None => event,
    };
    state.hub.publish(event).await;
    Ok(json!(cue))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearRequest {
    cue_id: Uuid,
}

pub async fn clear(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: ClearRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    roombus_db::repository::cues::clear(&state.db.pool, req.cue_id).await?;
    state
        .hub
        .publish(RoomEvent::new("cue:cleared", RoomEvent::room_channel(room_id), json!({ "cueId": req.cue_id })))
        .await;
    Ok(json!({}))
}
