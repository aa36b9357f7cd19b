//! AudioOutput — an egress destination (§3, §9 "Typed unions over loose
//! config objects").
//!
//! The per-type connection config is a tagged union rather than a config
//! struct with every field optional: `AudioOutputConfig` carries only the
//! fields meaningful for its variant, with the variant name as the
//! persisted `type` column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioOutput {
    pub id: Uuid,
    pub room_id: Uuid,
    pub config: AudioOutputConfig,
    pub codec: AudioCodec,
    pub bitrate_kbps: i32,
    pub sample_rate: i32,
    pub channels: i16,
    /// Bus name (e.g. "pgm", "aux1") → linear gain in `[0,1]`.
    pub bus_routing: HashMap<String, f32>,
    pub is_enabled: bool,
    pub is_active: bool,
    pub is_connected: bool,
    pub error_message: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub bytes_streamed: i64,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    Mp3,
    Aac,
    Opus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum AudioOutputConfig {
    Icecast {
        host: String,
        port: u16,
        mount: String,
        user: String,
        #[serde(skip_serializing)]
        password: String,
        ice_name: Option<String>,
        ice_description: Option<String>,
        ice_genre: Option<String>,
        ice_url: Option<String>,
        ice_public: bool,
    },
    Srt {
        host: String,
        port: u16,
        mode: SrtMode,
        stream_id: Option<String>,
        #[serde(skip_serializing)]
        passphrase: Option<String>,
        latency_ms: Option<u32>,
    },
    FileRecording {
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SrtMode {
    Caller,
    Listener,
    Rendezvous,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAudioOutputRequest {
    pub room_id: Uuid,
    pub config: AudioOutputConfig,
    pub codec: AudioCodec,
    #[validate(range(min = 32, max = 320))]
    pub bitrate_kbps: i32,
    pub sample_rate: Option<i32>,
    pub channels: Option<i16>,
    pub bus_routing: Option<HashMap<String, f32>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBusRoutingRequest {
    pub bus_routing: HashMap<String, f32>,
    pub changed_by: Option<Uuid>,
}
