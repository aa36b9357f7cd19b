//! Recording (§4.2): only HOST/admin may start; stop transitions
//! RECORDING → PROCESSING and sets duration.

use chrono::Utc;
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

pub async fn start(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let participant_id = session.participant_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;

    let recording = roombus_db::repository::recordings::start(&state.db.pool, Uuid::now_v7(), room_id, participant_id).await?;
    state
        .hub
        .publish(RoomEvent::new("recording:started", RoomEvent::room_channel(room_id), json!(recording)))
        .await;
    Ok(json!(recording))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordingIdRequest {
    recording_id: Uuid,
    started_at: Option<chrono::DateTime<Utc>>,
}

pub async fn stop(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: RecordingIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let duration_secs = req.started_at.map(|started| (Utc::now() - started).num_seconds().max(0)).unwrap_or(0);
    roombus_db::repository::recordings::stop(&state.db.pool, req.recording_id, duration_secs).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "recording:stopped",
            RoomEvent::room_channel(room_id),
            json!({ "recordingId": req.recording_id, "durationSecs": duration_secs }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn list(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let recordings = roombus_db::repository::recordings::list_for_room(&state.db.pool, room_id).await?;
    Ok(json!({ "recordings": recordings }))
}
