//! Egress Supervisor errors (§4.4, §7).

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum EgressError {
    #[error("output {0} is not running")]
    NotRunning(Uuid),

    #[error("output {0} not found")]
    OutputNotFound(Uuid),

    #[error("failed to spawn encoder: {0}")]
    SpawnFailed(String),

    #[error(transparent)]
    Sfu(#[from] roombus_sfu::SfuError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<EgressError> for roombus_common::error::RoomBusError {
    fn from(e: EgressError) -> Self {
        match e {
            EgressError::NotRunning(_) | EgressError::OutputNotFound(_) => {
                roombus_common::error::RoomBusError::NotFound { resource: e.to_string() }
            }
            EgressError::Sfu(err) => err.into(),
            EgressError::Database(err) => roombus_common::error::RoomBusError::Database(err),
            EgressError::SpawnFailed(msg) => roombus_common::error::RoomBusError::Process(msg),
            EgressError::Io(err) => roombus_common::error::RoomBusError::Process(err.to_string()),
        }
    }
}
