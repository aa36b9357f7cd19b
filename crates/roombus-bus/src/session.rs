//! Per-connection session state (§4.2 "State machine for a participant").
//!
//! One [`SessionState`] lives for the lifetime of a single WebSocket
//! connection. It starts `CONNECTED_UNJOINED`; `room:join` is the only
//! event it will process in that phase.

use tokio::sync::mpsc;
use uuid::Uuid;

use roombus_common::event::RoomEvent;
use roombus_common::permissions::ParticipantRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    ConnectedUnjoined,
    Waiting,
    InRoom,
    Disconnected,
}

pub struct SessionState {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub participant_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub authenticated: bool,
    pub role: Option<ParticipantRole>,
    pub display_name: Option<String>,
    pub mailbox_tx: mpsc::UnboundedSender<RoomEvent>,
    pub joined_channels: Vec<String>,
}

impl SessionState {
    pub fn new(mailbox_tx: mpsc::UnboundedSender<RoomEvent>) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            phase: SessionPhase::ConnectedUnjoined,
            participant_id: None,
            room_id: None,
            user_id: None,
            authenticated: false,
            role: None,
            display_name: None,
            mailbox_tx,
            joined_channels: Vec::new(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_some_and(ParticipantRole::is_privileged)
    }

    /// `true` once this session has already run its leave/disconnect path
    /// (§5 "per-participant disconnect idempotency" — a race between an
    /// explicit `room:leave` and the connection-close path must not double
    /// fire `mark_disconnected`/`room:participant-left`).
    pub fn has_left(&self) -> bool {
        matches!(self.phase, SessionPhase::Disconnected)
    }
}
