//! Remote DSP control (§4.2): clamps every value to its published range,
//! then only broadcasts — applying the change is the target client's job.
//! Nothing here is persisted; `MixState` in `roombus-mixer` is the
//! authoritative record of what the mix actually sounds like, not of what a
//! remote-control panel last requested.

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

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GainRequest {
    participant_id: Uuid,
    gain: f64,
}

pub async fn set_gain(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: GainRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let gain = clamp(req.gain, 0.0, 2.0);

    state
        .hub
        .publish(
            RoomEvent::new(
                "remote:gain-changed",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": req.participant_id, "gain": gain }),
            )
            .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({ "gain": gain }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MuteRequest {
    participant_id: Uuid,
    mute: bool,
}

pub async fn set_mute(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: MuteRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state
        .hub
        .publish(
            RoomEvent::new(
                "remote:mute-changed",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": req.participant_id, "mute": req.mute }),
            )
            .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({ "mute": req.mute }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EqBandRequest {
    participant_id: Uuid,
    band_hz: f64,
    gain_db: f64,
}

/// Frequencies are clamped to the decade band the panel is allowed to
/// control (20Hz-20kHz); gain to the published ±12dB range (§4.2).
pub async fn set_eq(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: EqBandRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let band_hz = clamp(req.band_hz, 20.0, 20_000.0);
    let gain_db = clamp(req.gain_db, -12.0, 12.0);

    state
        .hub
        .publish(
            RoomEvent::new(
                "remote:eq-changed",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": req.participant_id, "bandHz": band_hz, "gainDb": gain_db }),
            )
            .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({ "bandHz": band_hz, "gainDb": gain_db }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompressorRequest {
    participant_id: Uuid,
    threshold_db: f64,
    ratio: f64,
    attack_ms: f64,
    release_ms: f64,
}

pub async fn set_compressor(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: CompressorRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let threshold_db = clamp(req.threshold_db, -60.0, 0.0);
    let ratio = clamp(req.ratio, 1.0, 20.0);
    let attack_ms = clamp(req.attack_ms, 0.1, 1000.0);
    let release_ms = clamp(req.release_ms, 1.0, 5000.0);

    let payload = json!({
        "participantId": req.participant_id,
        "thresholdDb": threshold_db,
        "ratio": ratio,
        "attackMs": attack_ms,
        "releaseMs": release_ms,
    });
    state
        .hub
        .publish(RoomEvent::new("remote:compressor-changed", RoomEvent::room_channel(room_id), payload.clone()).targeted(vec![req.participant_id]))
        .await;
    Ok(payload)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GateRequest {
    participant_id: Uuid,
    threshold_db: f64,
    attack_ms: f64,
    release_ms: f64,
}

pub async fn set_gate(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: GateRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let threshold_db = clamp(req.threshold_db, -80.0, 0.0);
    let attack_ms = clamp(req.attack_ms, 0.1, 1000.0);
    let release_ms = clamp(req.release_ms, 1.0, 5000.0);

    let payload = json!({
        "participantId": req.participant_id,
        "thresholdDb": threshold_db,
        "attackMs": attack_ms,
        "releaseMs": release_ms,
    });
    state
        .hub
        .publish(RoomEvent::new("remote:gate-changed", RoomEvent::room_channel(room_id), payload.clone()).targeted(vec![req.participant_id]))
        .await;
    Ok(payload)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantRequest {
    participant_id: Uuid,
}

pub async fn reset(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: ParticipantRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state
        .hub
        .publish(
            RoomEvent::new("remote:reset", RoomEvent::room_channel(room_id), json!({ "participantId": req.participant_id }))
                .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({}))
}

/// Triggers the `remote:state-request` → `remote:state-response` round trip
/// (§4.2 "get-state triggers a round-trip").
pub async fn get_state(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let requester_id = session.participant_id.ok_or(RoomBusError::Forbidden)?;
    require_privileged(state, session).await?;
    let req: ParticipantRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state
        .hub
        .publish(
            RoomEvent::new(
                "remote:state-request",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": req.participant_id, "requestedBy": requester_id }),
            )
            .targeted(vec![req.participant_id]),
        )
        .await;
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResponseRequest {
    requested_by: Uuid,
    state: serde_json::Value,
}

/// The controlled client's reply to `remote:state-request`, relayed back to
/// whoever asked (§4.2).
pub async fn state_response(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let participant_id = session.participant_id.ok_or(RoomBusError::Forbidden)?;
    let req: StateResponseRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    state
        .hub
        .publish(
            RoomEvent::new(
                "remote:state-updated",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": participant_id, "state": req.state }),
            )
            .targeted(vec![req.requested_by]),
        )
        .await;
    Ok(json!({}))
}
