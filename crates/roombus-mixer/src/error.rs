//! Mix Coordinator errors (§4.3, §7).

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("room {0} has no mix state — call initRoom first")]
    RoomNotInitialized(Uuid),

    #[error("client {client} is not the primary writer for room {room}")]
    NotPrimary { room: Uuid, client: Uuid },

    #[error("room {0} already has a live primary writer")]
    PrimaryAlreadyRegistered(Uuid),

    #[error("channel {0} not found")]
    ChannelNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("state decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<MixerError> for roombus_common::error::RoomBusError {
    fn from(e: MixerError) -> Self {
        match e {
            MixerError::NotPrimary { .. } => roombus_common::error::RoomBusError::Forbidden,
            MixerError::RoomNotInitialized(_) | MixerError::ChannelNotFound(_) => {
                roombus_common::error::RoomBusError::NotFound { resource: e.to_string() }
            }
            MixerError::PrimaryAlreadyRegistered(_) => {
                roombus_common::error::RoomBusError::AlreadyExists { resource: "primary mixer".into() }
            }
            MixerError::Database(err) => roombus_common::error::RoomBusError::Database(err),
            MixerError::Decode(err) => roombus_common::error::RoomBusError::Internal(err.into()),
        }
    }
}
