//! Rundown (§4.2): transactional set-current; `rundown:get` returns the
//! item list for an already-created rundown.
//!
//! There is no find-rundown-by-room lookup in the repository layer —
//! rundown creation is out of scope for this bus (§1 Non-goals exclude
//! REST CRUD), so the client must already know its `rundownId`.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;

use crate::session::SessionState;
use crate::BusState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetCurrentRequest {
    rundown_id: Uuid,
    item_id: Uuid,
}

pub async fn set_current(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: SetCurrentRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;

    roombus_db::repository::rundowns::set_current(&state.db.pool, req.rundown_id, req.item_id).await?;
    let items = roombus_db::repository::rundowns::list_items(&state.db.pool, req.rundown_id).await?;

    state
        .hub
        .publish(RoomEvent::new(
            "rundown:current-changed",
            RoomEvent::room_channel(room_id),
            json!({ "rundownId": req.rundown_id, "itemId": req.item_id }),
        ))
        .await;
    Ok(json!({ "items": items }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetRequest {
    rundown_id: Uuid,
}

pub async fn get(state: &BusState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let req: GetRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let items = roombus_db::repository::rundowns::list_items(&state.db.pool, req.rundown_id).await?;
    Ok(json!({ "rundownId": req.rundown_id, "items": items }))
}
