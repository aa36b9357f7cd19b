//! # roombus-sfu
//!
//! SFU Orchestrator (§4.1): owns every WebRTC/plain-RTP object for every
//! room and exposes the room-scoped operations the Room Session Bus and the
//! egress/ingest supervisors call. Wraps `str0m` (sans-IO WebRTC) — this
//! crate drives the I/O and packet routing; `str0m` handles ICE/DTLS/SRTP.
//!
//! No business logic about *why* a bus or participant exists lives here —
//! that's the bus's job. This crate only answers "what SFU objects exist
//! for this room" and "create/connect/close one".

pub mod error;
pub mod orchestrator;
pub mod participant;
pub mod producer;
pub mod room;
pub mod transport;

pub use error::SfuError;
pub use orchestrator::{SfuOrchestrator, SfuStats};
pub use producer::{
    ConsumerRecord, MediaKind, ProducerAppData, ProducerRecord, RtpCapabilities, RtpParameters,
};
pub use transport::{
    DtlsParameters, DtlsState, IceParameters, PlainTransport, TransportDirection, WebRtcTransport,
};
