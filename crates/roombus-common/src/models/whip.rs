//! WHIPStream — a push-based WebRTC ingest with its own small state machine
//! (§4.5 "WHIP streams additionally carry a bearer token...").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhipStream {
    pub id: Uuid,
    pub room_id: Uuid,
    pub audio_source_id: Uuid,
    #[serde(skip_serializing)]
    pub bearer_token: String,
    pub state: WhipState,
    pub resource_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum WhipState {
    Pending,
    Connecting,
    Connected,
    Disconnected,
    Error,
}
