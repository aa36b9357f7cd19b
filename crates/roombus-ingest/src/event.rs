//! Events the ingest supervisor emits for the bus to turn into room
//! broadcasts (§4.5 `source:connectionStateChanged`, `producer:new`, WHIP
//! state transitions).
//!
//! Mirrors `roombus_egress::event` — the supervisor reports "this source
//! changed", leaving translation into the bus's `RoomEvent` envelope to
//! whoever owns the bus connection.

use roombus_common::models::audio_source::ConnectionState;
use roombus_common::models::whip::WhipState;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum IngestEvent {
    ConnectionStateChanged {
        room_id: Uuid,
        source_id: Uuid,
        state: ConnectionState,
        error: Option<String>,
    },
    ProducerReady {
        room_id: Uuid,
        source_id: Uuid,
        producer_id: Uuid,
    },
    WhipStateChanged {
        room_id: Uuid,
        whip_id: Uuid,
        audio_source_id: Uuid,
        state: WhipState,
    },
}
