//! Translates `EgressEvent`/`IngestEvent` into room broadcasts (§4.4, §4.5).
//!
//! Neither supervisor knows about `RoomEvent` or the bus's channel naming —
//! that translation is the Room Session Bus's job, since it's the only
//! component that owns `Hub`.

use std::sync::Arc;

use roombus_egress::{EgressEvent, EncoderState};
use roombus_ingest::IngestEvent;

use roombus_common::event::RoomEvent;

use crate::hub::Hub;

fn encoder_state_json(state: EncoderState) -> serde_json::Value {
    serde_json::to_value(state).expect("EncoderState always serializes")
}

/// Spawns a task draining `rx` for the lifetime of the process; returns
/// immediately.
pub fn spawn_egress_bridge(hub: Arc<Hub>, mut rx: tokio::sync::mpsc::UnboundedReceiver<EgressEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                EgressEvent::StateChanged { room_id, output_id, state, error } => {
                    hub.publish(RoomEvent::new(
                        "output:stateChanged",
                        RoomEvent::room_channel(room_id),
                        serde_json::json!({ "outputId": output_id, "state": encoder_state_json(state), "error": error }),
                    ))
                    .await;
                }
                EgressEvent::BusLevelsChanged { room_id, output_id, bus_routing, changed_by } => {
                    hub.publish(RoomEvent::new(
                        "output:busLevelsChanged",
                        RoomEvent::room_channel(room_id),
                        serde_json::json!({ "outputId": output_id, "busRouting": bus_routing, "changedBy": changed_by }),
                    ))
                    .await;
                }
            }
        }
    });
}

pub fn spawn_ingest_bridge(hub: Arc<Hub>, mut rx: tokio::sync::mpsc::UnboundedReceiver<IngestEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                IngestEvent::ConnectionStateChanged { room_id, source_id, state, error } => {
                    hub.publish(RoomEvent::new(
                        "source:connectionStateChanged",
                        RoomEvent::room_channel(room_id),
                        serde_json::json!({ "sourceId": source_id, "state": state, "error": error }),
                    ))
                    .await;
                }
                IngestEvent::ProducerReady { room_id, source_id, producer_id } => {
                    hub.publish(RoomEvent::new(
                        "producer:new",
                        RoomEvent::room_channel(room_id),
                        serde_json::json!({ "participantId": format!("source:{source_id}"), "producerId": producer_id }),
                    ))
                    .await;
                }
                IngestEvent::WhipStateChanged { room_id, whip_id, audio_source_id, state } => {
                    hub.publish(RoomEvent::new(
                        "whip:stream-updated",
                        RoomEvent::room_channel(room_id),
                        serde_json::json!({ "whipId": whip_id, "audioSourceId": audio_source_id, "state": state }),
                    ))
                    .await;
                }
            }
        }
    });
}
