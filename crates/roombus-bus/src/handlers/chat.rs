//! Chat (§4.2): CHAT/PRODUCER_NOTE/SYSTEM messages; recipient-scoped
//! messages get `chat:private` with a `forParticipantId` hint.

use serde::Deserialize;
use serde_json::json;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::chat::{ChatMessageType, SendChatRequest};

use crate::session::SessionState;
use crate::BusState;

pub async fn send(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (Some(room_id), Some(participant_id)) = (session.room_id, session.participant_id) else {
        return Err(RoomBusError::Forbidden);
    };
    let req: SendChatRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    if req.body.len() > state.config.limits.max_chat_message_length as usize {
        return Err(RoomBusError::Validation { message: "chat message too long".into() });
    }
    let message_type = req.message_type.unwrap_or(ChatMessageType::Chat);

    let message = roombus_db::repository::chat::create(
        &state.db.pool,
        uuid::Uuid::now_v7(),
        room_id,
        participant_id,
        message_type,
        &req.body,
        req.for_participant_id,
    )
    .await?;

    let event_name = match (message_type, req.for_participant_id) {
        (_, Some(_)) => "chat:private",
        (ChatMessageType::ProducerNote, None) => "chat:producer-note",
        _ => "chat:message",
    };
    let event = RoomEvent::new(event_name, RoomEvent::room_channel(room_id), json!(message));
    let event = match req.for_participant_id {
        Some(target) => event.targeted(vec![target, participant_id]),
        None => event,
    };
    state.hub.publish(event).await;
    Ok(json!(message))
}

#[derive(Debug, Deserialize)]
struct HistoryRequest {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn history(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: HistoryRequest = serde_json::from_value(data).unwrap_or(HistoryRequest { limit: default_limit() });
    let messages = roombus_db::repository::chat::history(&state.db.pool, room_id, req.limit).await?;
    Ok(json!({ "messages": messages }))
}
