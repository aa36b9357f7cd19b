//! RoomCue — a host-sent cue flashed to one or more participants (§4.2 Cues).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCue {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sent_by_id: Uuid,
    pub label: String,
    pub color: Option<String>,
    pub target_participant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendCueRequest {
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    pub color: Option<String>,
    pub target_participant_id: Option<Uuid>,
}
