//! IFB/Talkback (§4.2): `ifb:start` resolves the TB bus producer with a
//! bounded poll since it races host bus creation; IFB broadcasts on both
//! `room:<id>` and `<id>:ifb` (the channel a green room's participants join
//! at `room:join` time via [`RoomEvent::ifb_channel`]). Talkback groups are
//! plain named participant sets an IFB session can target.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::ifb::IfbTarget;
use roombus_common::models::talkback::CreateTalkbackGroupRequest;

use crate::session::SessionState;
use crate::BusState;

pub async fn create_group(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: CreateTalkbackGroupRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let group = roombus_db::repository::talkback::create_group(&state.db.pool, Uuid::now_v7(), room_id, &req.name).await?;
    state
        .hub
        .publish(RoomEvent::new("talkback:group-created", RoomEvent::room_channel(room_id), json!(group)))
        .await;
    Ok(json!(group))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupIdRequest {
    group_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateGroupRequest {
    group_id: Uuid,
    name: String,
}

pub async fn update_group(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: UpdateGroupRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::talkback::rename_group(&state.db.pool, req.group_id, &req.name).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "talkback:group-updated",
            RoomEvent::room_channel(room_id),
            json!({ "groupId": req.group_id, "name": req.name }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn delete_group(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: GroupIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::talkback::delete_group(&state.db.pool, req.group_id).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "talkback:group-deleted",
            RoomEvent::room_channel(room_id),
            json!({ "groupId": req.group_id }),
        ))
        .await;
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRequest {
    group_id: Uuid,
    participant_id: Uuid,
}

pub async fn add_member(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: MemberRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::talkback::add_member(&state.db.pool, req.group_id, req.participant_id).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "talkback:member-added",
            RoomEvent::room_channel(room_id),
            json!({ "groupId": req.group_id, "participantId": req.participant_id }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn remove_member(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: MemberRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::talkback::remove_member(&state.db.pool, req.group_id, req.participant_id).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "talkback:member-removed",
            RoomEvent::room_channel(room_id),
            json!({ "groupId": req.group_id, "participantId": req.participant_id }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn list_groups(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let groups = roombus_db::repository::talkback::list_groups(&state.db.pool, room_id).await?;
    Ok(json!({ "groups": groups }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartIfbRequest {
    #[serde(flatten)]
    target: IfbTarget,
}

/// Resolves the participant ids an IFB session targets: `All` broadcasts
/// with no targeting hint, `Group` resolves its member rows, `Participant`
/// is a singleton list.
async fn resolve_targets(state: &BusState, target: &IfbTarget) -> Result<Option<Vec<Uuid>>, RoomBusError> {
    match target {
        IfbTarget::All => Ok(None),
        IfbTarget::Participant { participant_id } => Ok(Some(vec![*participant_id])),
        IfbTarget::Group { group_id } => {
            let members = roombus_db::repository::talkback::members(&state.db.pool, *group_id).await?;
            Ok(Some(members.into_iter().map(|m| m.participant_id).collect()))
        }
    }
}

pub async fn start(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let participant_id = session.participant_id.ok_or(RoomBusError::Forbidden)?;
    let req: StartIfbRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    let session_row = roombus_db::repository::ifb::start(&state.db.pool, Uuid::now_v7(), room_id, participant_id, &req.target).await?;

    let mut warning = None;
    let bus_producer = state
        .sfu
        .get_bus_producer(room_id, "tb")
        .await
        .ok()
        .flatten();
    let (producer, owner) = match bus_producer {
        Some((owner, producer)) => (Some(producer), Some(owner)),
        None => {
            let mut found = None;
            for attempt in 0..state.config.limits.ifb_poll_max_retries {
                if let Some(hit) = state.sfu.get_bus_producer(room_id, "tb").await? {
                    found = Some(hit);
                    break;
                }
                if attempt + 1 < state.config.limits.ifb_poll_max_retries {
                    tokio::time::sleep(std::time::Duration::from_millis(state.config.limits.ifb_poll_interval_ms)).await;
                }
            }
            match found {
                Some((owner, producer)) => (Some(producer), Some(owner)),
                None => {
                    warning = Some("talkback bus producer not yet available".to_string());
                    (None, None)
                }
            }
        }
    };

    let targets = resolve_targets(state, &req.target).await?;
    let mut payload = json!({ "session": session_row, "producerId": producer, "participantId": owner });
    if let Some(warning) = &warning {
        payload["warning"] = json!(warning);
    }

    let mut event = RoomEvent::new("ifb:started", RoomEvent::room_channel(room_id), payload.clone());
    if let Some(targets) = targets.clone() {
        event = event.targeted(targets);
    }
    state.hub.publish(event).await;

    let mut ifb_event = RoomEvent::new("ifb:started", RoomEvent::ifb_channel(room_id), payload);
    if let Some(targets) = targets {
        ifb_event = ifb_event.targeted(targets);
    }
    state.hub.publish(ifb_event).await;

    Ok(json!({ "session": session_row, "warning": warning }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IfbSessionIdRequest {
    session_id: Uuid,
}

pub async fn update(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: IfbSessionIdRequest = serde_json::from_value(data.clone()).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    state
        .hub
        .publish(RoomEvent::new("ifb:updated", RoomEvent::room_channel(room_id), data))
        .await;
    Ok(json!({ "sessionId": req.session_id }))
}

pub async fn end(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: IfbSessionIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::ifb::end(&state.db.pool, req.session_id).await?;
    state
        .hub
        .publish(RoomEvent::new(
            "ifb:ended",
            RoomEvent::room_channel(room_id),
            json!({ "sessionId": req.session_id }),
        ))
        .await;
    state
        .hub
        .publish(RoomEvent::new(
            "ifb:ended",
            RoomEvent::ifb_channel(room_id),
            json!({ "sessionId": req.session_id }),
        ))
        .await;
    Ok(json!({}))
}

pub async fn list(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let sessions = roombus_db::repository::ifb::list_active(&state.db.pool, room_id).await?;
    Ok(json!({ "sessions": sessions }))
}
