//! Participant model.
//!
//! The persisted row and the in-memory SFU-side counterpart are
//! deliberately separate types: the row is what survives a process
//! restart and what other components join against; the in-memory side
//! (transports/producers/consumers) lives entirely in `roombus-sfu`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::ParticipantRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: ParticipantRole,
    pub is_connected: bool,
    pub is_speaking: bool,
    pub is_muted: bool,
    pub is_in_waiting_room: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl Participant {
    /// Role assignment on join (§4.2): HOST if the joiner created the room,
    /// PARTICIPANT if authenticated, LISTENER otherwise.
    pub fn role_for_join(user_id: Option<Uuid>, created_by_id: Uuid) -> ParticipantRole {
        match user_id {
            Some(uid) if uid == created_by_id => ParticipantRole::Host,
            Some(_) => ParticipantRole::Participant,
            None => ParticipantRole::Listener,
        }
    }
}
