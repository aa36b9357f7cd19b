//! Room model — the top-level container a session joins.
//!
//! Rooms nest: a LIVE_ROOM may have GREEN_ROOM or BREAKOUT children via
//! `parent_id`. Green-room participants hear the parent's IFB/talkback but
//! are never mixed into the parent's program bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub visibility: RoomVisibility,
    pub access_code: Option<String>,
    pub invite_token: Option<String>,
    pub is_active: bool,
    pub capacity: i32,
    pub waiting_room: bool,
    pub recording_enabled: bool,
    pub room_type: RoomType,
    pub parent_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub organization_id: Option<Uuid>,
    /// Persisted snapshot of the in-memory `MixState` (§3, §6 "Persisted mix-state blob").
    pub mix_state: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomVisibility {
    Private,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    LiveRoom,
    GreenRoom,
    Breakout,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 200, message = "Room name must be 1-200 characters"))]
    pub name: String,
    pub visibility: RoomVisibility,
    pub access_code: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    pub waiting_room: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub room_type: Option<RoomType>,
    pub parent_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub visibility: Option<RoomVisibility>,
    pub access_code: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    pub waiting_room: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub is_active: Option<bool>,
}
