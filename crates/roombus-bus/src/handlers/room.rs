//! Connection & join (§4.2 "Connection & join", "State machine for a
//! participant").

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::auth;
use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::participant::Participant;
use roombus_common::models::room::RoomVisibility;

use crate::session::{SessionPhase, SessionState};
use crate::BusState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    room_id: Uuid,
    display_name: String,
    access_code: Option<String>,
    token: Option<String>,
    #[allow(dead_code)]
    time_zone_offset: Option<i32>,
}

pub async fn join(state: &BusState, session: &mut SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let req: JoinRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let room = roombus_db::repository::rooms::find_by_id(&state.db.pool, req.room_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("room {}", req.room_id) })?;

    if !room.is_active {
        return Err(RoomBusError::Validation { message: "room is not active".into() });
    }

    let connected = roombus_db::repository::participants::count_connected(&state.db.pool, room.id).await?;
    if connected >= room.capacity as i64 {
        return Err(RoomBusError::RoomFull);
    }

    if room.visibility == RoomVisibility::Public {
        if let Some(code) = &room.access_code {
            if req.access_code.as_deref() != Some(code.as_str()) {
                return Err(RoomBusError::Forbidden);
            }
        }
    } else if req.token.is_none() {
        return Err(RoomBusError::Unauthenticated);
    }

    let mut user_id = None;
    let mut authenticated = false;
    if let Some(token) = &req.token {
        let claims = auth::validate_token(token, &state.config.auth.jwt_secret).map_err(|_| RoomBusError::InvalidToken)?;
        let uid: Uuid = claims.sub.parse().map_err(|_| RoomBusError::InvalidToken)?;
        user_id = Some(uid);
        authenticated = true;
    }

    let waits = room.waiting_room && user_id != Some(room.created_by_id);
    let role = Participant::role_for_join(if authenticated { user_id } else { None }, room.created_by_id);

    let participant = roombus_db::repository::participants::create_participant(
        &state.db.pool,
        Uuid::now_v7(),
        room.id,
        user_id,
        &req.display_name,
        role,
        waits,
    )
    .await?;

    session.participant_id = Some(participant.id);
    session.room_id = Some(room.id);
    session.user_id = user_id;
    session.authenticated = authenticated;
    session.role = Some(role);
    session.display_name = Some(req.display_name.clone());

    let room_channel = RoomEvent::room_channel(room.id);
    state.hub.join(&room_channel, participant.id, session.mailbox_tx.clone()).await;
    session.joined_channels.push(room_channel.clone());

    if waits {
        let waiting_channel = RoomEvent::waiting_channel(room.id);
        state.hub.join(&waiting_channel, participant.id, session.mailbox_tx.clone()).await;
        session.joined_channels.push(waiting_channel);
    }

    if let Some(parent_id) = room.parent_id {
        let ifb_channel = RoomEvent::ifb_channel(parent_id);
        state.hub.join(&ifb_channel, participant.id, session.mailbox_tx.clone()).await;
        session.joined_channels.push(ifb_channel);
    }

    if waits {
        session.phase = SessionPhase::Waiting;
        state
            .hub
            .publish(RoomEvent::new(
                "waitingroom:new-participant",
                room_channel,
                json!({ "participantId": participant.id, "displayName": participant.display_name }),
            ))
            .await;
        return Ok(json!({ "status": "waiting", "participant": participant }));
    }

    session.phase = SessionPhase::InRoom;
    state.sfu.get_or_create_room(room.id).await?;
    state.sfu.add_participant(room.id, participant.id, participant.display_name.clone()).await?;
    let rtp_capabilities = state.sfu.rtp_capabilities(room.id).await?;
    let producers = state.sfu.get_producers_in_room(room.id, Some(participant.id)).await?;

    Ok(json!({
        "status": "joined",
        "participant": participant,
        "rtpCapabilities": rtp_capabilities,
        "iceServers": crate::ice_servers(),
        "producers": producers.into_iter().map(|(owner, producer)| json!({ "participantId": owner, "producerId": producer })).collect::<Vec<_>>(),
    }))
}

/// `room:leave` and disconnect share this path (§4.2 "Disconnect").
///
/// Idempotent: a session that already ran this (an explicit `room:leave`
/// followed by the connection loop's own unconditional call on exit) must
/// not mark the row disconnected or broadcast `room:participant-left` a
/// second time (§5 "per-participant disconnect idempotency").
pub async fn leave(state: &BusState, session: &mut SessionState) {
    if session.has_left() {
        return;
    }
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        session.phase = SessionPhase::Disconnected;
        return;
    };

    // No explicit mixer unregister call exists: a disconnected primary simply
    // stops heartbeating and the heartbeat window in `roombus-mixer` lets
    // another client take over (§4.3 `takeover`).
    let _ = state.sfu.close_participant(room_id, participant_id).await;
    let _ = roombus_db::repository::participants::mark_disconnected(&state.db.pool, participant_id).await;

    state.hub.leave_all(participant_id, &session.joined_channels).await;
    session.joined_channels.clear();

    state
        .hub
        .publish(RoomEvent::new(
            "room:participant-left",
            RoomEvent::room_channel(room_id),
            json!({ "participantId": participant_id }),
        ))
        .await;

    session.phase = SessionPhase::Disconnected;
}
