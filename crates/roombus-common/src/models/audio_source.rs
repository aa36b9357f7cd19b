//! AudioSource — an ingest origin (§3, §4.5).
//!
//! Mirrors [`crate::models::audio_output::AudioOutputConfig`]'s tagged-union
//! shape: only the fields meaningful to the source type are present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: Uuid,
    pub room_id: Uuid,
    pub config: AudioSourceConfig,
    pub playback_state: PlaybackState,
    pub connection_state: ConnectionState,
    pub error_message: Option<String>,
    /// Port allocated for LISTENER-mode SRT/RIST ingest (§4.5, §6).
    pub listener_port: Option<u16>,
    pub remote_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioSourceConfig {
    HttpStream { url: String },
    File { path: String, looped: bool },
    Tone { frequency_hz: f32 },
    Silence,
    SrtStream {
        mode: SourceTransportMode,
        host: Option<String>,
        port: Option<u16>,
        stream_id: Option<String>,
        #[serde(skip_serializing)]
        passphrase: Option<String>,
        latency_ms: Option<u32>,
    },
    RistStream {
        mode: SourceTransportMode,
        host: Option<String>,
        port: Option<u16>,
    },
    Participant { participant_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceTransportMode {
    Listener,
    Caller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionState {
    Idle,
    Listening,
    Connecting,
    Connected,
    Error,
    Disconnected,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAudioSourceRequest {
    pub room_id: Uuid,
    pub config: AudioSourceConfig,
}
