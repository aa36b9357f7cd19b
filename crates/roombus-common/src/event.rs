//! The envelope the bus broadcasts to connected sessions.
//!
//! Request/reply traffic (§4.2) is handled directly by each bus event
//! handler; `RoomEvent` is specifically the shape of *broadcasts* —
//! `producer:new`, `room:participant-left`, `mix:state-change`, and so on —
//! so every broadcaster builds the same envelope regardless of which
//! component raised it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, JSON-payload broadcast scoped to a bus channel (`room:<id>`,
/// `room:<id>:waiting`, `room:<id>:ifb`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEvent {
    pub event: String,
    pub data: serde_json::Value,
    /// Channel this event is broadcast on, e.g. `room:<id>` or `room:<id>:ifb`.
    pub channel: String,
    /// When set, only these participants should act on the event even though
    /// it was broadcast room-wide (IFB group targeting, `chat:private`, §4.2).
    pub for_participant_ids: Option<Vec<Uuid>>,
}

impl RoomEvent {
    pub fn new(event: impl Into<String>, channel: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
            channel: channel.into(),
            for_participant_ids: None,
        }
    }

    pub fn targeted(mut self, ids: Vec<Uuid>) -> Self {
        self.for_participant_ids = Some(ids);
        self
    }

    pub fn room_channel(room_id: Uuid) -> String {
        format!("room:{room_id}")
    }

    pub fn waiting_channel(room_id: Uuid) -> String {
        format!("room:{room_id}:waiting")
    }

    pub fn ifb_channel(room_id: Uuid) -> String {
        format!("{room_id}:ifb")
    }
}
