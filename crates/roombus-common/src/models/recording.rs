//! Recording — a room-level recording lifecycle (§4.2 Recording).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: Uuid,
    pub room_id: Uuid,
    pub started_by_id: Uuid,
    pub state: RecordingState,
    pub file_path: Option<String>,
    pub duration_secs: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordingState {
    Recording,
    Processing,
    Complete,
    Failed,
}
