//! Timers (§4.2): elapsed/remaining time is always derived from `startedAt`
//! at read time, never stored as a live-ticking number.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_common::models::timer::TimerKind;

use crate::session::SessionState;
use crate::BusState;

fn with_derived(timer: roombus_common::models::timer::RoomTimer) -> serde_json::Value {
    let now = Utc::now();
    let mut value = serde_json::to_value(&timer).expect("RoomTimer always serializes");
    if let Some(obj) = value.as_object_mut() {
        obj.insert("elapsedSecs".into(), json!(timer.elapsed_secs(now)));
        obj.insert("remainingSecs".into(), json!(timer.remaining_secs(now)));
    }
    value
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    label: String,
    kind: TimerKind,
    duration_secs: Option<i64>,
}

pub async fn create(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: CreateRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let timer = roombus_db::repository::timers::create(&state.db.pool, Uuid::now_v7(), room_id, &req.label, req.kind, req.duration_secs).await?;
    let payload = with_derived(timer);
    state
        .hub
        .publish(RoomEvent::new("timer:created", RoomEvent::room_channel(room_id), payload.clone()))
        .await;
    Ok(payload)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimerIdRequest {
    timer_id: Uuid,
}

async fn reload_and_broadcast(state: &BusState, room_id: Uuid, timer_id: Uuid, event: &str) -> Result<serde_json::Value, RoomBusError> {
    let timer = roombus_db::repository::timers::find_by_id(&state.db.pool, timer_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("timer {timer_id}") })?;
    let payload = with_derived(timer);
    state.hub.publish(RoomEvent::new(event, RoomEvent::room_channel(room_id), payload.clone())).await;
    Ok(payload)
}

pub async fn start(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: TimerIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::timers::start(&state.db.pool, req.timer_id).await?;
    reload_and_broadcast(state, room_id, req.timer_id, "timer:started").await
}

pub async fn pause(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: TimerIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let timer = roombus_db::repository::timers::find_by_id(&state.db.pool, req.timer_id)
        .await?
        .ok_or(RoomBusError::NotFound { resource: format!("timer {}", req.timer_id) })?;
    let elapsed = timer.elapsed_secs(Utc::now());
    roombus_db::repository::timers::pause(&state.db.pool, req.timer_id, elapsed).await?;
    reload_and_broadcast(state, room_id, req.timer_id, "timer:paused").await
}

pub async fn reset(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: TimerIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::timers::reset(&state.db.pool, req.timer_id).await?;
    reload_and_broadcast(state, room_id, req.timer_id, "timer:reset").await
}

pub async fn delete(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let req: TimerIdRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    roombus_db::repository::timers::delete(&state.db.pool, req.timer_id).await?;
    state
        .hub
        .publish(RoomEvent::new("timer:deleted", RoomEvent::room_channel(room_id), json!({ "timerId": req.timer_id })))
        .await;
    Ok(json!({}))
}

pub async fn list(state: &BusState, session: &SessionState) -> Result<serde_json::Value, RoomBusError> {
    let room_id = session.room_id.ok_or(RoomBusError::Forbidden)?;
    let timers = roombus_db::repository::timers::list_for_room(&state.db.pool, room_id).await?;
    let timers: Vec<_> = timers.into_iter().map(with_derived).collect();
    Ok(json!({ "timers": timers }))
}
