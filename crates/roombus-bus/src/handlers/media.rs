//! Media (§4.2): thin delegates to the SFU Orchestrator with a
//! room-membership precondition.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_sfu::{orchestrator::parse_app_data, DtlsParameters, TransportDirection};

use crate::session::SessionState;
use crate::BusState;

fn require_room(session: &SessionState) -> Result<(Uuid, Uuid), RoomBusError> {
    match (session.room_id, session.participant_id) {
        (Some(room), Some(participant)) => Ok((room, participant)),
        _ => Err(RoomBusError::Forbidden),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransportRequest {
    direction: TransportDirection,
}

pub async fn transport_create(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (room_id, participant_id) = require_room(session)?;
    let req: CreateTransportRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let (id, ice, dtls) = state.sfu.create_webrtc_transport(room_id, participant_id, req.direction).await?;
    Ok(json!({ "transportId": id, "iceParameters": ice, "dtlsParameters": dtls }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectTransportRequest {
    direction: TransportDirection,
    dtls_parameters: DtlsParameters,
}

pub async fn transport_connect(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (room_id, participant_id) = require_room(session)?;
    let req: ConnectTransportRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    state
        .sfu
        .connect_transport(room_id, participant_id, req.direction, req.dtls_parameters)
        .await?;
    Ok(json!({}))
}

pub async fn producer_create(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (room_id, participant_id) = require_room(session)?;
    let app_data = parse_app_data(data.get("appData").unwrap_or(&serde_json::Value::Null));
    let is_bus_output = app_data.is_bus_output;
    let producer = state.sfu.create_producer(room_id, participant_id, app_data).await?;

    if !is_bus_output {
        state
            .hub
            .publish(RoomEvent::new(
                "producer:new",
                RoomEvent::room_channel(room_id),
                json!({ "participantId": participant_id, "producerId": producer.id }),
            ))
            .await;
    }

    Ok(json!({ "producerId": producer.id }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateConsumerRequest {
    producer_participant_id: Uuid,
    producer_id: Option<Uuid>,
}

pub async fn consumer_create(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (room_id, participant_id) = require_room(session)?;
    let req: CreateConsumerRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    let consumer = state
        .sfu
        .create_consumer(room_id, participant_id, req.producer_participant_id, req.producer_id)
        .await?;
    Ok(json!({
        "consumerId": consumer.id,
        "producerId": consumer.producer_id,
        "rtpParameters": consumer.rtp_parameters,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResumeConsumerRequest {
    consumer_id: Uuid,
}

pub async fn consumer_resume(state: &BusState, session: &SessionState, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    let (room_id, participant_id) = require_room(session)?;
    let req: ResumeConsumerRequest = serde_json::from_value(data).map_err(|e| RoomBusError::Validation { message: e.to_string() })?;
    state.sfu.resume_consumer(room_id, participant_id, req.consumer_id).await?;
    Ok(json!({}))
}
