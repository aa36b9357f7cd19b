//! Events the supervisor emits for the bus to turn into room broadcasts
//! (§4.4 `output:stateChanged`, `output:busLevelsChanged`).
//!
//! The supervisor doesn't know about the bus's `RoomEvent` envelope or its
//! room/waiting/IFB channel naming — it only reports "this output changed",
//! leaving the translation to whoever owns the bus connection.

use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderState {
    Starting,
    Running,
    Restarting,
    Stopped,
    Error,
}

#[derive(Debug, Clone)]
pub enum EgressEvent {
    StateChanged {
        room_id: Uuid,
        output_id: Uuid,
        state: EncoderState,
        error: Option<String>,
    },
    BusLevelsChanged {
        room_id: Uuid,
        output_id: Uuid,
        bus_routing: HashMap<String, f32>,
        changed_by: Option<Uuid>,
    },
}
