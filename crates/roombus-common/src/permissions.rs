//! Participant roles and the privilege checks the bus applies to them.
//!
//! Unlike the old bitfield permission system this core has no per-channel
//! overrides to reconcile — a Participant's role is looked up fresh from its
//! row (never trusted from a cached session value) and checked against a
//! fixed privilege floor per action class (§4.2 "Per-role authorization").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipantRole {
    Host,
    Moderator,
    Participant,
    Listener,
}

impl ParticipantRole {
    /// True for roles allowed to perform privileged actions (§4.2): remote
    /// DSP control, kick, close room, green-room management, countdown,
    /// registering as primary mixer, starting a recording.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Host | Self::Moderator)
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Host => "HOST",
            Self::Moderator => "MODERATOR",
            Self::Participant => "PARTICIPANT",
            Self::Listener => "LISTENER",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_moderator_are_privileged() {
        assert!(ParticipantRole::Host.is_privileged());
        assert!(ParticipantRole::Moderator.is_privileged());
    }

    #[test]
    fn participant_and_listener_are_not_privileged() {
        assert!(!ParticipantRole::Participant.is_privileged());
        assert!(!ParticipantRole::Listener.is_privileged());
    }
}
