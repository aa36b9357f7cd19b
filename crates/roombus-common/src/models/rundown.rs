//! Rundown + RundownItem — the show's run-of-show list (§4.2 Rundown).
//!
//! `rundown:set-current` switches the current item inside a transaction
//! (§5 "Shared-resource policy"): the previous current item is marked
//! completed and the new one marked started, or neither change lands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rundown {
    pub id: Uuid,
    pub room_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RundownItem {
    pub id: Uuid,
    pub rundown_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub position: i32,
    pub planned_duration_secs: Option<i32>,
    pub is_current: bool,
    pub is_completed: bool,
    pub actual_start_at: Option<DateTime<Utc>>,
    pub actual_end_at: Option<DateTime<Utc>>,
}
