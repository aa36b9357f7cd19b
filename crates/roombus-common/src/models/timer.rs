//! RoomTimer — a count-up or countdown clock shared across a room
//! (§4.2 Timers).
//!
//! Elapsed/remaining time is never stored as a live-ticking number; it is
//! always derived from `started_at` at read time (§4.2: "Elapsed time on
//! pause is computed as wall-clock delta since `startedAt`").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomTimer {
    pub id: Uuid,
    pub room_id: Uuid,
    pub label: String,
    pub kind: TimerKind,
    pub duration_secs: Option<i64>,
    pub state: TimerState,
    pub started_at: Option<DateTime<Utc>>,
    /// Accumulated elapsed time from prior start/pause cycles.
    pub accumulated_secs: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerKind {
    CountUp,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
}

impl RoomTimer {
    /// Elapsed seconds as of `now`, including the in-flight running segment.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        match (self.state, self.started_at) {
            (TimerState::Running, Some(started)) => {
                self.accumulated_secs + (now - started).num_seconds().max(0)
            }
            _ => self.accumulated_secs,
        }
    }

    /// Remaining seconds for a countdown; clamps at 0 (§4.2).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        match self.kind {
            TimerKind::Countdown => {
                let duration = self.duration_secs?;
                Some((duration - self.elapsed_secs(now)).max(0))
            }
            TimerKind::CountUp => None,
        }
    }
}
