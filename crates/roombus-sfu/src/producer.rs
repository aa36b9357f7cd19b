//! Producer and consumer bookkeeping records (§3 "Producer record", §4.1).
//!
//! These are plain in-memory records, not the str0m-level media state itself
//! — the orchestrator tags every producer with the bus metadata the rest of
//! the system (egress, IFB) needs to find it again without understanding
//! WebRTC internals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What this producer carries on the wire. Audio only — no video in this
/// core (§1 scope is broadcast-contribution audio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Audio,
}

/// Opus RTP parameters the orchestrator negotiates for every producer and
/// consumer (§4.1 `getOrCreateRoom`: "Opus at 48 kHz, stereo, with
/// useinbandfec=1 and minptime=10").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtpParameters {
    pub codec: String,
    pub clock_rate: u32,
    pub channels: u8,
    pub payload_type: u8,
    pub use_inband_fec: bool,
    pub minptime_ms: u32,
}

impl RtpParameters {
    /// The single codec profile this SFU speaks (§4.1, §6).
    pub fn opus_default(config: &roombus_common::config::SfuConfig) -> Self {
        Self {
            codec: "opus".to_string(),
            clock_rate: config.audio_clock_rate,
            channels: config.audio_channels,
            payload_type: 111,
            use_inband_fec: true,
            minptime_ms: 10,
        }
    }
}

/// What a session in the room can decode — exchanged once at join time
/// (§4.2 `room:join` response: "the router's RTP capabilities").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtpCapabilities {
    pub codecs: Vec<RtpParameters>,
}

/// A tag applied to bus-output producers (§3 "Producer record"):
/// `(busType, isBusOutput)`. Plain participant microphones carry
/// `bus_type: None, is_bus_output: false`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProducerAppData {
    pub bus_type: Option<String>,
    #[serde(default)]
    pub is_bus_output: bool,
}

/// An SFU producer, bound to a participant's send transport (or a plain
/// producer-side transport for ingest).
#[derive(Debug, Clone)]
pub struct ProducerRecord {
    pub id: Uuid,
    pub owner_participant_id: Uuid,
    pub kind: MediaKind,
    pub rtp_parameters: RtpParameters,
    pub bus_type: Option<String>,
    pub is_bus_output: bool,
    pub closed: bool,
    pub paused: bool,
}

impl ProducerRecord {
    /// A producer is a valid bus-output candidate for §4.1 `getBusProducer`
    /// lookup only while live: not closed, not paused.
    pub fn is_live_bus_output(&self, bus_type: &str) -> bool {
        self.is_bus_output
            && !self.closed
            && !self.paused
            && self
                .bus_type
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(bus_type))
    }
}

/// An SFU consumer, bound to a participant's recv transport.
///
/// Created paused (§4.1 `createConsumer`: "the client resumes explicitly").
#[derive(Debug, Clone)]
pub struct ConsumerRecord {
    pub id: Uuid,
    pub owner_participant_id: Uuid,
    pub producer_id: Uuid,
    pub rtp_parameters: RtpParameters,
    pub paused: bool,
    pub closed: bool,
}
