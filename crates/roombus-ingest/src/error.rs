//! Ingest Supervisor errors (§4.5, §7).

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("source {0} not found")]
    SourceNotFound(Uuid),

    #[error("source {0} is not running")]
    NotRunning(Uuid),

    #[error("whip stream {0} not found")]
    WhipNotFound(Uuid),

    #[error("invalid bearer token for whip stream {0}")]
    InvalidBearerToken(Uuid),

    #[error("no ports available in configured range")]
    PortsExhausted,

    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sfu(#[from] roombus_sfu::SfuError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for roombus_common::error::RoomBusError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::SourceNotFound(_) | IngestError::NotRunning(_) | IngestError::WhipNotFound(_) => {
                roombus_common::error::RoomBusError::NotFound { resource: e.to_string() }
            }
            IngestError::InvalidBearerToken(_) => roombus_common::error::RoomBusError::Forbidden,
            IngestError::PortsExhausted => roombus_common::error::RoomBusError::Transient { what: "ingest port".into() },
            IngestError::InvalidConfig(message) => roombus_common::error::RoomBusError::Validation { message },
            IngestError::Sfu(err) => err.into(),
            IngestError::Database(err) => roombus_common::error::RoomBusError::Database(err),
            IngestError::Io(err) => roombus_common::error::RoomBusError::Process(err.to_string()),
        }
    }
}
