//! WHIP ingest (§4.5 "WHIP streams additionally carry a bearer token and a
//! small state machine: `PENDING -> CONNECTING -> CONNECTED -> DISCONNECTED
//! | ERROR`").
//!
//! Unlike SRT/RIST, a WHIP session is already WebRTC, so there is no child
//! process to spawn — the session terminates directly on the orchestrator's
//! own `WebRtcTransport` the same way a room participant's send transport
//! does. Extracting ICE/DTLS parameters out of the raw SDP offer the client
//! POSTs is the caller's job (the bus's HTTP façade); this module only
//! drives the state machine and the SFU calls once those parameters are in
//! hand.

use std::sync::Arc;

use uuid::Uuid;

use roombus_common::models::whip::{WhipState, WhipStream};
use roombus_db::Database;
use roombus_sfu::{DtlsParameters, IceParameters, ProducerAppData, SfuOrchestrator, TransportDirection};

use crate::error::IngestError;
use crate::event::IngestEvent;

pub struct WhipSupervisor {
    sfu: Arc<SfuOrchestrator>,
    db: Database,
    events_tx: tokio::sync::mpsc::UnboundedSender<IngestEvent>,
}

impl WhipSupervisor {
    pub fn new(
        sfu: Arc<SfuOrchestrator>,
        db: Database,
        events_tx: tokio::sync::mpsc::UnboundedSender<IngestEvent>,
    ) -> Self {
        Self { sfu, db, events_tx }
    }

    fn emit(&self, event: IngestEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Registers a new WHIP endpoint in `PENDING` state, ready to accept one
    /// offer.
    pub async fn create_session(
        &self,
        room_id: Uuid,
        audio_source_id: Uuid,
        bearer_token: &str,
    ) -> Result<WhipStream, IngestError> {
        let whip = roombus_db::repository::whip::create(&self.db.pool, Uuid::now_v7(), room_id, audio_source_id, bearer_token)
            .await?;
        Ok(whip)
    }

    /// Accepts the client's SDP offer (already parsed into ICE/DTLS params
    /// by the caller), creates a send transport and producer, and returns
    /// the local transport's parameters for the SDP answer.
    pub async fn accept_offer(
        &self,
        whip_id: Uuid,
        bearer_token: &str,
        client_dtls: DtlsParameters,
    ) -> Result<(Uuid, IceParameters, DtlsParameters, Uuid), IngestError> {
        let whip = roombus_db::repository::whip::find_by_id(&self.db.pool, whip_id)
            .await?
            .ok_or(IngestError::WhipNotFound(whip_id))?;
        if whip.bearer_token != bearer_token {
            return Err(IngestError::InvalidBearerToken(whip_id));
        }

        roombus_db::repository::whip::set_state(&self.db.pool, whip_id, WhipState::Connecting, None).await?;
        self.emit(IngestEvent::WhipStateChanged {
            room_id: whip.room_id,
            whip_id,
            audio_source_id: whip.audio_source_id,
            state: WhipState::Connecting,
        });

        self.sfu
            .add_participant(whip.room_id, whip.audio_source_id, format!("whip:{}", whip.audio_source_id))
            .await?;
        let (transport_id, ice, dtls) = self
            .sfu
            .create_webrtc_transport(whip.room_id, whip.audio_source_id, TransportDirection::Send)
            .await?;
        self.sfu
            .connect_transport(whip.room_id, whip.audio_source_id, TransportDirection::Send, client_dtls)
            .await?;
        let producer = self
            .sfu
            .create_producer(whip.room_id, whip.audio_source_id, ProducerAppData::default())
            .await?;

        let resource_url = format!("/whip/resource/{whip_id}");
        roombus_db::repository::whip::set_state(&self.db.pool, whip_id, WhipState::Connected, Some(&resource_url)).await?;
        self.emit(IngestEvent::WhipStateChanged {
            room_id: whip.room_id,
            whip_id,
            audio_source_id: whip.audio_source_id,
            state: WhipState::Connected,
        });

        Ok((transport_id, ice, dtls, producer.id))
    }

    /// Tears down a WHIP session (DELETE on its resource URL).
    pub async fn delete_session(&self, whip_id: Uuid) -> Result<(), IngestError> {
        let whip = roombus_db::repository::whip::find_by_id(&self.db.pool, whip_id)
            .await?
            .ok_or(IngestError::WhipNotFound(whip_id))?;

        let _ = self.sfu.close_participant(whip.room_id, whip.audio_source_id).await;
        roombus_db::repository::whip::set_state(&self.db.pool, whip_id, WhipState::Disconnected, None).await?;
        self.emit(IngestEvent::WhipStateChanged {
            room_id: whip.room_id,
            whip_id,
            audio_source_id: whip.audio_source_id,
            state: WhipState::Disconnected,
        });
        roombus_db::repository::whip::delete(&self.db.pool, whip_id).await?;
        Ok(())
    }
}
