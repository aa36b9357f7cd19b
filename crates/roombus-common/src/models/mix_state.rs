//! Mix state types shared between the persisted `Room.mixState` blob and the
//! in-memory coordinator state owned by `roombus-mixer` (§3, §4.3, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type ChannelId = String;

/// Persisted/mirrored per-room mix snapshot. Round-trips through
/// `Room.mixState` exactly (§6, §8 "Persisting and restoring... `restore(persist(S)) = S`").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMixState {
    pub channels: HashMap<ChannelId, ChannelMix>,
    pub master: MasterMix,
    pub solo_mode: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelMix {
    pub gain: f32,
    pub pan: f32,
    pub fader: f32,
    pub mute: bool,
    pub solo: bool,
    pub pfl: bool,
    pub eq: EqSettings,
    pub gate: GateSettings,
    pub compressor: CompressorSettings,
    /// Bus name → whether this channel is routed to it.
    pub routing: HashMap<String, bool>,
}

impl Default for ChannelMix {
    /// New channels start with unity fader, flat EQ, gate/compressor off,
    /// routed to PGM only, pan centered (§4.3 "Defaults").
    fn default() -> Self {
        let mut routing = HashMap::new();
        routing.insert("pgm".to_string(), true);
        Self {
            gain: 1.0,
            pan: 0.0,
            fader: 1.0,
            mute: false,
            solo: false,
            pfl: false,
            eq: EqSettings::default(),
            gate: GateSettings::default(),
            compressor: CompressorSettings::default(),
            routing,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EqSettings {
    pub low_gain_db: f32,
    pub mid_gain_db: f32,
    pub high_gain_db: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GateSettings {
    pub enabled: bool,
    pub threshold_db: f32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self { enabled: false, threshold_db: -40.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompressorSettings {
    pub enabled: bool,
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -20.0,
            ratio: 2.0,
            attack_ms: 10.0,
            release_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MasterMix {
    pub gain: f32,
    pub mute: bool,
}

/// A single `mix:state-change` payload (§4.2, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixStateChange {
    #[serde(rename = "type")]
    pub change_type: MixChangeType,
    pub channel_id: Option<ChannelId>,
    pub changes: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub client_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixChangeType {
    Channel,
    Master,
    Routing,
    Full,
}
