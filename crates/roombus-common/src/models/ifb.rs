//! IFBSession — a live interruptible-fold-back session targeting all, a
//! talkback group, or a single participant (§4.2 IFB/Talkback).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfbSession {
    pub id: Uuid,
    pub room_id: Uuid,
    pub started_by_id: Uuid,
    pub target: IfbTarget,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "targetType", rename_all = "UPPERCASE")]
pub enum IfbTarget {
    All,
    Group { group_id: Uuid },
    Participant { participant_id: Uuid },
}

#[derive(Debug, Deserialize)]
pub struct StartIfbRequest {
    #[serde(flatten)]
    pub target: IfbTarget,
}
