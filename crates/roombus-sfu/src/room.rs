//! RoomRouter — per-room SFU state (§3 "RoomRouter").
//!
//! Owns one router (represented here by the shared Opus RTP parameters every
//! producer/consumer in the room negotiates), the participant map, and the
//! two plain-RTP transport maps: consumer-side (egress, keyed by output id)
//! and producer-side (ingest, keyed by source id).
//!
//! All mutation goes through a single `Mutex` per room (§5 "Per-room SFU
//! lock"): every operation in `crate::SfuOrchestrator` that touches this
//! room's maps holds it for the duration of the call, so two rooms are
//! never serialized against each other but one room's operations always are.

use std::collections::HashMap;
use uuid::Uuid;

use crate::participant::ParticipantSlot;
use crate::producer::RtpParameters;
use crate::transport::PlainTransport;

pub struct RoomRouter {
    pub room_id: Uuid,
    /// Index of the worker this room was bound to (§4.1 `initialize`).
    pub worker_index: usize,
    pub codec: RtpParameters,
    pub participants: HashMap<Uuid, ParticipantSlot>,
    /// Consumer-side plain transports for egress, keyed by `AudioOutput` id
    /// (or a caller-chosen output key for multi-bus encoders, §4.4).
    pub consumer_plain_transports: HashMap<String, PlainTransport>,
    /// Producer-side plain transports for ingest, keyed by `AudioSource` id.
    pub producer_plain_transports: HashMap<Uuid, PlainTransport>,
}

impl RoomRouter {
    pub fn new(room_id: Uuid, worker_index: usize, codec: RtpParameters) -> Self {
        Self {
            room_id,
            worker_index,
            codec,
            participants: HashMap::new(),
            consumer_plain_transports: HashMap::new(),
            producer_plain_transports: HashMap::new(),
        }
    }

    /// §4.1 `getBusProducer`: first live match for `(roomId, busType)`,
    /// filtering stale (closed/paused) producers at read time (§3 invariant,
    /// §8 "Bus producer lookup skips stale").
    pub fn bus_producer(&self, bus_type: &str) -> Option<(Uuid, Uuid)> {
        for participant in self.participants.values() {
            for producer in participant.producers.values() {
                if producer.is_live_bus_output(bus_type) {
                    return Some((participant.id, producer.id));
                }
            }
        }
        None
    }

    /// §4.1 `getProducersInRoom`: primary-producer entries plus ingest
    /// producers (exposed by the ingest supervisor as `source:<id>`
    /// participant slots sharing this same map).
    pub fn producers_excluding(&self, exclude_participant_id: Option<Uuid>) -> Vec<(Uuid, Uuid)> {
        let mut out = Vec::new();
        for participant in self.participants.values() {
            if Some(participant.id) == exclude_participant_id {
                continue;
            }
            if let Some(pid) = participant.primary_producer_id {
                if participant.producers.get(&pid).is_some_and(|p| !p.closed) {
                    out.push((participant.id, pid));
                }
            }
        }
        out
    }

    pub fn is_empty_of_live_participants(&self) -> bool {
        self.participants.is_empty()
    }
}
