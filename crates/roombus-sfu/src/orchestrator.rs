//! SFU Orchestrator (§4.1) — the operations table the rest of the core
//! calls against. One [`SfuOrchestrator`] per process; internally keyed by
//! `roomId`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use roombus_common::config::SfuConfig;

use crate::error::SfuError;
use crate::participant::ParticipantSlot;
use crate::producer::{
    ConsumerRecord, MediaKind, ProducerAppData, ProducerRecord, RtpCapabilities, RtpParameters,
};
use crate::room::RoomRouter;
use crate::transport::{DtlsParameters, PlainTransport, TransportDirection, WebRtcTransport};

/// A single SFU worker slot (§4.1 `initialize`: "construct a pool of N SFU
/// workers; on worker death, replace the worker at the same index"). A
/// worker here is just a round-robin bucket — the actual per-peer work is
/// the `str0m::Rtc` instances each [`WebRtcTransport`] owns; there is no
/// separate worker process to supervise the way a native mediasoup-worker
/// binary would be, so "worker death" degrades to "index still exists".
struct Worker {
    index: usize,
}

pub struct SfuOrchestrator {
    config: SfuConfig,
    bind_ip: std::net::IpAddr,
    workers: Vec<Worker>,
    next_worker: AtomicUsize,
    rooms: RwLock<HashMap<Uuid, RoomRouter>>,
}

#[derive(Debug, serde::Serialize)]
pub struct SfuStats {
    pub active_rooms: usize,
    pub total_participants: usize,
    pub worker_count: usize,
}

impl SfuOrchestrator {
    /// §4.1 `initialize()`.
    pub fn new(config: SfuConfig, bind_ip: std::net::IpAddr) -> Self {
        let workers = (0..config.worker_count as usize)
            .map(|index| Worker { index })
            .collect();
        Self {
            config,
            bind_ip,
            workers,
            next_worker: AtomicUsize::new(0),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    fn pick_worker(&self) -> Result<usize, SfuError> {
        if self.workers.is_empty() {
            return Err(SfuError::NoWorkers);
        }
        let i = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        Ok(self.workers[i].index)
    }

    /// §4.1 `getOrCreateRoom(roomId)` — idempotent; binds a router on the
    /// next worker with the configured Opus codec list.
    pub async fn get_or_create_room(&self, room_id: Uuid) -> Result<(), SfuError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room_id) {
            return Ok(());
        }
        let worker_index = self.pick_worker()?;
        let codec = RtpParameters::opus_default(&self.config);
        rooms.insert(room_id, RoomRouter::new(room_id, worker_index, codec));
        tracing::info!(room = %room_id, worker = worker_index, "SFU room created");
        Ok(())
    }

    /// §4.1 `closeRoom(roomId)` — closes every participant (collecting
    /// errors), every plain-RTP transport, then the router. Errors during
    /// cleanup never abort the sequence (§7).
    pub async fn close_room(&self, room_id: Uuid) -> Vec<SfuError> {
        let mut errors = Vec::new();
        let mut rooms = self.rooms.write().await;
        if let Some(mut room) = rooms.remove(&room_id) {
            for participant in room.participants.values_mut() {
                participant.close_all();
            }
            for (_, t) in room.consumer_plain_transports.drain() {
                t.close();
            }
            for (_, t) in room.producer_plain_transports.drain() {
                t.close();
            }
            tracing::info!(room = %room_id, "SFU room closed");
        } else {
            errors.push(SfuError::RoomNotFound(room_id));
        }
        errors
    }

    async fn with_room<F, T>(&self, room_id: Uuid, f: F) -> Result<T, SfuError>
    where
        F: FnOnce(&mut RoomRouter) -> Result<T, SfuError>,
    {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        f(room)
    }

    /// §4.1 `addParticipant` — allocates the in-memory participant slot.
    pub async fn add_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        display_name: String,
    ) -> Result<(), SfuError> {
        self.with_room(room_id, |room| {
            room.participants
                .entry(participant_id)
                .or_insert_with(|| ParticipantSlot::new(participant_id, display_name));
            Ok(())
        })
        .await
    }

    /// §4.1 `createWebRtcTransport` — creates a transport, assigns it to
    /// the participant's send or recv slot.
    pub async fn create_webrtc_transport(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        direction: TransportDirection,
    ) -> Result<(Uuid, crate::transport::IceParameters, DtlsParameters), SfuError> {
        let transport = WebRtcTransport::new(self.bind_ip, direction).await?;
        let id = transport.id;
        let ice = transport.ice.clone();
        let dtls = transport.dtls.clone();

        self.with_room(room_id, |room| {
            let participant = room
                .participants
                .get_mut(&participant_id)
                .ok_or(SfuError::ParticipantNotFound(participant_id))?;
            match direction {
                TransportDirection::Send => participant.send_transport = Some(transport),
                TransportDirection::Recv => participant.recv_transport = Some(transport),
            }
            Ok(())
        })
        .await?;

        Ok((id, ice, dtls))
    }

    /// §4.1 `connectTransport` — applies DTLS parameters.
    pub async fn connect_transport(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        direction: TransportDirection,
        dtls: DtlsParameters,
    ) -> Result<(), SfuError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        let participant = room
            .participants
            .get(&participant_id)
            .ok_or(SfuError::ParticipantNotFound(participant_id))?;
        let transport = participant
            .transport_for(direction)
            .ok_or(SfuError::TransportNotFound(participant_id))?;
        transport.connect(dtls).await
    }

    /// §4.1 `createProducer` — produces on the send transport; records
    /// `(busType, isBusOutput)` from `appData`; sets the primary-producer
    /// pointer for non-bus producers.
    pub async fn create_producer(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        app_data: ProducerAppData,
    ) -> Result<ProducerRecord, SfuError> {
        self.with_room(room_id, |room| {
            let codec = room.codec.clone();
            let participant = room
                .participants
                .get_mut(&participant_id)
                .ok_or(SfuError::ParticipantNotFound(participant_id))?;
            if participant.send_transport.is_none() {
                return Err(SfuError::TransportNotFound(participant_id));
            }
            let record = ProducerRecord {
                id: Uuid::now_v7(),
                owner_participant_id: participant_id,
                kind: MediaKind::Audio,
                rtp_parameters: codec,
                bus_type: app_data.bus_type,
                is_bus_output: app_data.is_bus_output,
                closed: false,
                paused: false,
            };
            if !record.is_bus_output {
                participant.primary_producer_id = Some(record.id);
            }
            participant.producers.insert(record.id, record.clone());
            Ok(record)
        })
        .await
    }

    /// §4.1 `createConsumer` — resolves the target producer per the rules
    /// in the operation description, then creates a paused consumer.
    ///
    /// `producer_participant_id` starting with `source:` is handled by the
    /// caller stripping the prefix and passing the resolved ingest
    /// participant id; this orchestrator only sees plain UUIDs.
    pub async fn create_consumer(
        &self,
        room_id: Uuid,
        consumer_participant_id: Uuid,
        producer_participant_id: Uuid,
        specific_producer_id: Option<Uuid>,
    ) -> Result<ConsumerRecord, SfuError> {
        self.with_room(room_id, |room| {
            if !room.participants.contains_key(&consumer_participant_id) {
                return Err(SfuError::ParticipantNotFound(consumer_participant_id));
            }
            let codec = room.codec.clone();
            let source = room
                .participants
                .get(&producer_participant_id)
                .ok_or(SfuError::ParticipantNotFound(producer_participant_id))?;

            let producer_id = match specific_producer_id {
                Some(pid) => pid,
                None => source
                    .primary_producer_id
                    .ok_or(SfuError::ProducerNotFound(producer_participant_id))?,
            };
            if !source.producers.contains_key(&producer_id) {
                return Err(SfuError::ProducerNotFound(producer_id));
            }

            let consumer_owner = room
                .participants
                .get_mut(&consumer_participant_id)
                .expect("checked above");
            if consumer_owner.recv_transport.is_none() {
                return Err(SfuError::TransportNotFound(consumer_participant_id));
            }

            let record = ConsumerRecord {
                id: Uuid::now_v7(),
                owner_participant_id: consumer_participant_id,
                producer_id,
                rtp_parameters: codec,
                paused: true,
                closed: false,
            };
            consumer_owner.consumers.insert(record.id, record.clone());
            Ok(record)
        })
        .await
    }

    /// §4.1 `resumeConsumer`.
    pub async fn resume_consumer(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        consumer_id: Uuid,
    ) -> Result<(), SfuError> {
        self.with_room(room_id, |room| {
            let participant = room
                .participants
                .get_mut(&participant_id)
                .ok_or(SfuError::ParticipantNotFound(participant_id))?;
            let consumer = participant
                .consumers
                .get_mut(&consumer_id)
                .ok_or(SfuError::ConsumerNotFound(consumer_id))?;
            consumer.paused = false;
            Ok(())
        })
        .await
    }

    /// §4.1 `getBusProducer(roomId, busType)`.
    pub async fn get_bus_producer(&self, room_id: Uuid, bus_type: &str) -> Result<Option<(Uuid, Uuid)>, SfuError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        Ok(room.bus_producer(bus_type))
    }

    /// §4.1 `getProducersInRoom`.
    pub async fn get_producers_in_room(
        &self,
        room_id: Uuid,
        exclude_participant_id: Option<Uuid>,
    ) -> Result<Vec<(Uuid, Uuid)>, SfuError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        Ok(room.producers_excluding(exclude_participant_id))
    }

    pub async fn rtp_capabilities(&self, room_id: Uuid) -> Result<RtpCapabilities, SfuError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        Ok(RtpCapabilities { codecs: vec![room.codec.clone()] })
    }

    /// §4.1 `createPlainTransport(roomId, outputKey)` — consumer-side, for
    /// egress. Binds loopback; the external port the encoder is told to
    /// listen on is the loopback port plus the configured offset.
    pub async fn create_plain_transport(
        &self,
        room_id: Uuid,
        output_key: String,
    ) -> Result<(u16, u16), SfuError> {
        let transport = PlainTransport::bind(false, self.config.plain_transport_port_offset).await?;
        let local = transport.local_port;
        let external = transport.external_port;
        self.with_room(room_id, |room| {
            room.consumer_plain_transports.insert(output_key, transport);
            Ok(())
        })
        .await?;
        Ok((local, external))
    }

    /// §4.1 `consumeWithPlainTransport(roomId, outputKey, producerId)` —
    /// connects the plain transport to the encoder's external port and
    /// returns the RTP parameters + external port pair for its config.
    pub async fn consume_with_plain_transport(
        &self,
        room_id: Uuid,
        output_key: &str,
        encoder_addr: SocketAddr,
    ) -> Result<(RtpParameters, u16), SfuError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id).ok_or(SfuError::RoomNotFound(room_id))?;
        let transport = room
            .consumer_plain_transports
            .get(output_key)
            .ok_or(SfuError::TransportNotFound(room_id))?;
        transport.connect_to(encoder_addr).await?;
        Ok((room.codec.clone(), transport.external_port))
    }

    /// §4.1 `createPlainTransportForProducer(roomId, sourceId)` —
    /// producer-side, `comedia=true`, for ingest.
    pub async fn create_plain_transport_for_producer(
        &self,
        room_id: Uuid,
        source_id: Uuid,
    ) -> Result<u16, SfuError> {
        let transport = PlainTransport::bind(true, self.config.plain_transport_port_offset).await?;
        let port = transport.local_port;
        self.with_room(room_id, |room| {
            room.producer_plain_transports.insert(source_id, transport);
            Ok(())
        })
        .await?;
        Ok(port)
    }

    /// §4.1 `createProducerOnPlainTransport(roomId, sourceId, ...)` —
    /// produces Opus/48k/stereo payload type 111 on the ingest transport,
    /// exposed to other participants as `source:<id>`.
    pub async fn create_producer_on_plain_transport(
        &self,
        room_id: Uuid,
        source_id: Uuid,
        display_name: String,
    ) -> Result<ProducerRecord, SfuError> {
        self.with_room(room_id, |room| {
            if !room.producer_plain_transports.contains_key(&source_id) {
                return Err(SfuError::TransportNotFound(source_id));
            }
            let codec = room.codec.clone();
            let participant = room
                .participants
                .entry(source_id)
                .or_insert_with(|| ParticipantSlot::new(source_id, display_name));
            let record = ProducerRecord {
                id: Uuid::now_v7(),
                owner_participant_id: source_id,
                kind: MediaKind::Audio,
                rtp_parameters: codec,
                bus_type: None,
                is_bus_output: false,
                closed: false,
                paused: false,
            };
            participant.primary_producer_id = Some(record.id);
            participant.producers.insert(record.id, record.clone());
            Ok(record)
        })
        .await
    }

    /// Close one participant's SFU resources (used by `room:leave` /
    /// disconnect, §4.2, §5 "Per-participant disconnect idempotency").
    pub async fn close_participant(&self, room_id: Uuid, participant_id: Uuid) -> Result<(), SfuError> {
        self.with_room(room_id, |room| {
            if let Some(mut p) = room.participants.remove(&participant_id) {
                p.close_all();
            }
            Ok(())
        })
        .await
    }

    pub async fn stats(&self) -> SfuStats {
        let rooms = self.rooms.read().await;
        let total_participants = rooms.values().map(|r| r.participants.len()).sum();
        SfuStats {
            active_rooms: rooms.len(),
            total_participants,
            worker_count: self.workers.len(),
        }
    }
}

/// JSON convenience wrapper for bus handlers that carry `appData` as a raw
/// `serde_json::Value` over the wire.
pub fn parse_app_data(value: &Value) -> ProducerAppData {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SfuConfig {
        SfuConfig {
            worker_count: 2,
            plain_transport_port_offset: 10_000,
            audio_clock_rate: 48_000,
            audio_channels: 2,
        }
    }

    #[tokio::test]
    async fn get_or_create_room_is_idempotent() {
        let orch = SfuOrchestrator::new(cfg(), "127.0.0.1".parse().unwrap());
        let room_id = Uuid::now_v7();
        orch.get_or_create_room(room_id).await.unwrap();
        orch.get_or_create_room(room_id).await.unwrap();
        assert_eq!(orch.stats().await.active_rooms, 1);
    }

    #[tokio::test]
    async fn bus_producer_lookup_skips_stale() {
        let orch = SfuOrchestrator::new(cfg(), "127.0.0.1".parse().unwrap());
        let room_id = Uuid::now_v7();
        orch.get_or_create_room(room_id).await.unwrap();

        let p1 = Uuid::now_v7();
        orch.add_participant(room_id, p1, "host".into()).await.unwrap();
        orch.create_webrtc_transport(room_id, p1, TransportDirection::Send)
            .await
            .unwrap();
        let stale = orch
            .create_producer(
                room_id,
                p1,
                ProducerAppData { bus_type: Some("pgm".into()), is_bus_output: true },
            )
            .await
            .unwrap();

        let p2 = Uuid::now_v7();
        orch.add_participant(room_id, p2, "host2".into()).await.unwrap();
        orch.create_webrtc_transport(room_id, p2, TransportDirection::Send)
            .await
            .unwrap();
        let live = orch
            .create_producer(
                room_id,
                p2,
                ProducerAppData { bus_type: Some("PGM".into()), is_bus_output: true },
            )
            .await
            .unwrap();

        // Close the first producer so it becomes stale.
        orch.with_room(room_id, |room| {
            room.participants
                .get_mut(&p1)
                .unwrap()
                .producers
                .get_mut(&stale.id)
                .unwrap()
                .closed = true;
            Ok(())
        })
        .await
        .unwrap();

        let (_, found) = orch.get_bus_producer(room_id, "pgm").await.unwrap().unwrap();
        assert_eq!(found, live.id);
    }

    #[tokio::test]
    async fn create_consumer_falls_back_to_primary_producer() {
        let orch = SfuOrchestrator::new(cfg(), "127.0.0.1".parse().unwrap());
        let room_id = Uuid::now_v7();
        orch.get_or_create_room(room_id).await.unwrap();

        let speaker = Uuid::now_v7();
        orch.add_participant(room_id, speaker, "speaker".into()).await.unwrap();
        orch.create_webrtc_transport(room_id, speaker, TransportDirection::Send)
            .await
            .unwrap();
        let producer = orch
            .create_producer(room_id, speaker, ProducerAppData::default())
            .await
            .unwrap();

        let listener = Uuid::now_v7();
        orch.add_participant(room_id, listener, "listener".into()).await.unwrap();
        orch.create_webrtc_transport(room_id, listener, TransportDirection::Recv)
            .await
            .unwrap();

        let consumer = orch
            .create_consumer(room_id, listener, speaker, None)
            .await
            .unwrap();
        assert_eq!(consumer.producer_id, producer.id);
        assert!(consumer.paused);
    }
}
