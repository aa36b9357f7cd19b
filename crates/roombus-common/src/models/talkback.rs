//! TalkbackGroup — named groupings of participants an IFB session can target
//! (§4.2 IFB/Talkback).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkbackGroup {
    pub id: Uuid,
    pub room_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkbackGroupMember {
    pub group_id: Uuid,
    pub participant_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTalkbackGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
