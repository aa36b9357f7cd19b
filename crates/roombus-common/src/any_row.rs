//! Manual `sqlx::FromRow<'_, sqlx::any::AnyRow>` implementations for every
//! roombus-common model.
//!
//! `sqlx::AnyPool` only decodes primitive types natively (i64, f64, bool,
//! String, bytes). UUID and DateTime columns are stored and decoded as
//! `String`; tagged-union config columns (`AudioOutputConfig`,
//! `AudioSourceConfig`, `IfbTarget`) and the mix-state blob are stored as
//! JSON text.
//!
//! **Why manual instead of `#[derive(sqlx::FromRow)]`?** The derive macro
//! generates a blanket `impl<DB>`. Rust's coherence checker rejects a manual
//! `impl<AnyRow>` alongside that blanket even though the bounds are never
//! satisfied for `Any`, because a future downstream crate might add the
//! missing impls. Writing the `AnyRow` impl directly sidesteps the conflict.

use chrono::{DateTime, Utc};
use sqlx::{any::AnyRow, Row};
use uuid::Uuid;

use crate::models::{
    audio_output::{AudioCodec, AudioOutput, AudioOutputConfig},
    audio_source::{AudioSource, ConnectionState, PlaybackState},
    chat::{ChatMessage, ChatMessageType},
    cue::RoomCue,
    ifb::IfbSession,
    participant::Participant,
    recording::{Recording, RecordingState},
    room::{Room, RoomType, RoomVisibility},
    rundown::{Rundown, RundownItem},
    talkback::{TalkbackGroup, TalkbackGroupMember},
    timer::{RoomTimer, TimerKind, TimerState},
    whip::{WhipStream, WhipState},
};
use crate::permissions::ParticipantRole;

// ── Internal helpers ────────────────────────────────────────────────────────

fn uuid(row: &AnyRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

fn opt_uuid(row: &AnyRow, col: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| Uuid::parse_str(&v).map_err(|e| sqlx::Error::Decode(Box::new(e) as _)))
        .transpose()
}

fn dt(row: &AnyRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    parse_dt(&s).map_err(sqlx::Error::Decode)
}

fn opt_dt(row: &AnyRow, col: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| parse_dt(&v).map_err(sqlx::Error::Decode)).transpose()
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(d.and_utc());
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(d.and_utc());
    }
    Err(format!("cannot parse timestamp '{s}'").into())
}

fn json(row: &AnyRow, col: &str) -> Result<serde_json::Value, sqlx::Error> {
    let s: String = row.try_get(col)?;
    serde_json::from_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

fn json_as<T: serde::de::DeserializeOwned>(row: &AnyRow, col: &str) -> Result<T, sqlx::Error> {
    let v = json(row, col)?;
    serde_json::from_value(v).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

fn parse_enum<T>(row: &AnyRow, col: &str, f: impl Fn(&str) -> Option<T>) -> Result<T, sqlx::Error> {
    let s: String = row.try_get(col)?;
    f(&s).ok_or_else(|| sqlx::Error::Decode(format!("unknown enum variant: {s}").into()))
}

// ── Room ─────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Room {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Room {
            id: uuid(row, "id")?,
            name: row.try_get("name")?,
            visibility: parse_enum(row, "visibility", |s| match s {
                "PRIVATE" => Some(RoomVisibility::Private),
                "PUBLIC" => Some(RoomVisibility::Public),
                _ => None,
            })?,
            access_code: row.try_get("access_code")?,
            invite_token: row.try_get("invite_token")?,
            is_active: row.try_get("is_active")?,
            capacity: row.try_get("capacity")?,
            waiting_room: row.try_get("waiting_room")?,
            recording_enabled: row.try_get("recording_enabled")?,
            room_type: parse_enum(row, "room_type", |s| match s {
                "LIVE_ROOM" => Some(RoomType::LiveRoom),
                "GREEN_ROOM" => Some(RoomType::GreenRoom),
                "BREAKOUT" => Some(RoomType::Breakout),
                _ => None,
            })?,
            parent_id: opt_uuid(row, "parent_id")?,
            created_by_id: uuid(row, "created_by_id")?,
            organization_id: opt_uuid(row, "organization_id")?,
            mix_state: json(row, "mix_state")?,
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── Participant ──────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Participant {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Participant {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            user_id: opt_uuid(row, "user_id")?,
            display_name: row.try_get("display_name")?,
            role: parse_enum(row, "role", |s| match s {
                "HOST" => Some(ParticipantRole::Host),
                "MODERATOR" => Some(ParticipantRole::Moderator),
                "PARTICIPANT" => Some(ParticipantRole::Participant),
                "LISTENER" => Some(ParticipantRole::Listener),
                _ => None,
            })?,
            is_connected: row.try_get("is_connected")?,
            is_speaking: row.try_get("is_speaking")?,
            is_muted: row.try_get("is_muted")?,
            is_in_waiting_room: row.try_get("is_in_waiting_room")?,
            joined_at: dt(row, "joined_at")?,
            left_at: opt_dt(row, "left_at")?,
        })
    }
}

// ── AudioOutput ──────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for AudioOutput {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AudioOutput {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            config: json_as::<AudioOutputConfig>(row, "config")?,
            codec: parse_enum(row, "codec", |s| match s {
                "mp3" => Some(AudioCodec::Mp3),
                "aac" => Some(AudioCodec::Aac),
                "opus" => Some(AudioCodec::Opus),
                _ => None,
            })?,
            bitrate_kbps: row.try_get("bitrate_kbps")?,
            sample_rate: row.try_get("sample_rate")?,
            channels: row.try_get("channels")?,
            bus_routing: json_as(row, "bus_routing")?,
            is_enabled: row.try_get("is_enabled")?,
            is_active: row.try_get("is_active")?,
            is_connected: row.try_get("is_connected")?,
            error_message: row.try_get("error_message")?,
            connected_at: opt_dt(row, "connected_at")?,
            bytes_streamed: row.try_get("bytes_streamed")?,
            retry_count: row.try_get("retry_count")?,
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── AudioSource ──────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for AudioSource {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AudioSource {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            config: json_as(row, "config")?,
            playback_state: parse_enum(row, "playback_state", |s| match s {
                "STOPPED" => Some(PlaybackState::Stopped),
                "PLAYING" => Some(PlaybackState::Playing),
                "PAUSED" => Some(PlaybackState::Paused),
                _ => None,
            })?,
            connection_state: parse_enum(row, "connection_state", |s| match s {
                "IDLE" => Some(ConnectionState::Idle),
                "LISTENING" => Some(ConnectionState::Listening),
                "CONNECTING" => Some(ConnectionState::Connecting),
                "CONNECTED" => Some(ConnectionState::Connected),
                "ERROR" => Some(ConnectionState::Error),
                "DISCONNECTED" => Some(ConnectionState::Disconnected),
                _ => None,
            })?,
            error_message: row.try_get("error_message")?,
            listener_port: row
                .try_get::<Option<i64>, _>("listener_port")?
                .map(|p| p as u16),
            remote_address: row.try_get("remote_address")?,
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── RoomCue ──────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for RoomCue {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(RoomCue {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            sent_by_id: uuid(row, "sent_by_id")?,
            label: row.try_get("label")?,
            color: row.try_get("color")?,
            target_participant_id: opt_uuid(row, "target_participant_id")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

// ── Rundown / RundownItem ────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Rundown {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Rundown {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            name: row.try_get("name")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for RundownItem {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(RundownItem {
            id: uuid(row, "id")?,
            rundown_id: uuid(row, "rundown_id")?,
            title: row.try_get("title")?,
            notes: row.try_get("notes")?,
            position: row.try_get("position")?,
            planned_duration_secs: row.try_get("planned_duration_secs")?,
            is_current: row.try_get("is_current")?,
            is_completed: row.try_get("is_completed")?,
            actual_start_at: opt_dt(row, "actual_start_at")?,
            actual_end_at: opt_dt(row, "actual_end_at")?,
        })
    }
}

// ── TalkbackGroup / member ───────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for TalkbackGroup {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(TalkbackGroup {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            name: row.try_get("name")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for TalkbackGroupMember {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(TalkbackGroupMember {
            group_id: uuid(row, "group_id")?,
            participant_id: uuid(row, "participant_id")?,
        })
    }
}

// ── IfbSession ───────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for IfbSession {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(IfbSession {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            started_by_id: uuid(row, "started_by_id")?,
            target: json_as(row, "target")?,
            started_at: dt(row, "started_at")?,
            ended_at: opt_dt(row, "ended_at")?,
        })
    }
}

// ── ChatMessage ──────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for ChatMessage {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(ChatMessage {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            sender_participant_id: uuid(row, "sender_participant_id")?,
            message_type: parse_enum(row, "message_type", |s| match s {
                "CHAT" => Some(ChatMessageType::Chat),
                "PRODUCER_NOTE" => Some(ChatMessageType::ProducerNote),
                "SYSTEM" => Some(ChatMessageType::System),
                _ => None,
            })?,
            body: row.try_get("body")?,
            for_participant_id: opt_uuid(row, "for_participant_id")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

// ── RoomTimer ────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for RoomTimer {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(RoomTimer {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            label: row.try_get("label")?,
            kind: parse_enum(row, "kind", |s| match s {
                "COUNT_UP" => Some(TimerKind::CountUp),
                "COUNTDOWN" => Some(TimerKind::Countdown),
                _ => None,
            })?,
            duration_secs: row.try_get("duration_secs")?,
            state: parse_enum(row, "state", |s| match s {
                "STOPPED" => Some(TimerState::Stopped),
                "RUNNING" => Some(TimerState::Running),
                "PAUSED" => Some(TimerState::Paused),
                _ => None,
            })?,
            started_at: opt_dt(row, "started_at")?,
            accumulated_secs: row.try_get("accumulated_secs")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

// ── Recording ────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Recording {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Recording {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            started_by_id: uuid(row, "started_by_id")?,
            state: parse_enum(row, "state", |s| match s {
                "RECORDING" => Some(RecordingState::Recording),
                "PROCESSING" => Some(RecordingState::Processing),
                "COMPLETE" => Some(RecordingState::Complete),
                "FAILED" => Some(RecordingState::Failed),
                _ => None,
            })?,
            file_path: row.try_get("file_path")?,
            duration_secs: row.try_get("duration_secs")?,
            started_at: dt(row, "started_at")?,
            ended_at: opt_dt(row, "ended_at")?,
        })
    }
}

// ── WhipStream ───────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for WhipStream {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(WhipStream {
            id: uuid(row, "id")?,
            room_id: uuid(row, "room_id")?,
            audio_source_id: uuid(row, "audio_source_id")?,
            bearer_token: row.try_get("bearer_token")?,
            state: parse_enum(row, "state", |s| match s {
                "PENDING" => Some(WhipState::Pending),
                "CONNECTING" => Some(WhipState::Connecting),
                "CONNECTED" => Some(WhipState::Connected),
                "DISCONNECTED" => Some(WhipState::Disconnected),
                "ERROR" => Some(WhipState::Error),
                _ => None,
            })?,
            resource_url: row.try_get("resource_url")?,
            created_at: dt(row, "created_at")?,
        })
    }
}

