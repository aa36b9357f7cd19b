//! SFU Orchestrator errors (§4.1 "Failure semantics").

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SfuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebRTC error: {0}")]
    Rtc(#[from] str0m::RtcError),

    #[error("SDP error: {0}")]
    Sdp(String),

    #[error("room {0} not found")]
    RoomNotFound(Uuid),

    #[error("participant {0} not found")]
    ParticipantNotFound(Uuid),

    #[error("transport {0} not found")]
    TransportNotFound(Uuid),

    #[error("producer {0} not found")]
    ProducerNotFound(Uuid),

    #[error("consumer {0} not found")]
    ConsumerNotFound(Uuid),

    #[error("no SFU workers available")]
    NoWorkers,

    #[error("no ports available in configured range")]
    PortsExhausted,
}

impl From<SfuError> for roombus_common::error::RoomBusError {
    fn from(e: SfuError) -> Self {
        roombus_common::error::RoomBusError::Sfu(e.to_string())
    }
}
