//! # roombus-bus
//!
//! Room Session Bus (§4.2): the authenticated, event-driven WebSocket
//! namespace (`/call-center`) that ties the SFU Orchestrator, Mix
//! Coordinator, Egress/Ingest Supervisors, and persistence together for a
//! connected client.
//!
//! A session starts `CONNECTED_UNJOINED`; `room:join` is the only event
//! accepted in that phase. Every other inbound frame is a
//! [`protocol::ClientEnvelope`] dispatched to one of the `handlers` modules
//! by event name, replied to with a [`protocol::ReplyEnvelope`] carrying the
//! same `request_id`. Broadcasts fan out independently as
//! [`protocol::BroadcastEnvelope`] frames via each session's mailbox.

pub mod bridges;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod session;

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use roombus_common::config::AppConfig;
use roombus_common::error::RoomBusError;
use roombus_common::event::RoomEvent;
use roombus_db::Database;
use roombus_mixer::MixCoordinator;
use roombus_sfu::SfuOrchestrator;

use hub::Hub;
use protocol::{BroadcastEnvelope, ClientEnvelope, ReplyEnvelope};
use session::{SessionPhase, SessionState};

/// Shared state handed to every connection (§2 "Room Session Bus sits above
/// all of the above").
#[derive(Clone)]
pub struct BusState {
    pub db: Database,
    pub config: &'static AppConfig,
    pub hub: Arc<Hub>,
    pub sfu: Arc<SfuOrchestrator>,
    pub mixer: Arc<MixCoordinator>,
    /// Green-room queue/countdown state (§4.2 `greenroom:update-queue`):
    /// ephemeral, keyed by green-room id. Not one of §3's persisted
    /// entities — the queue is a live presentation aid, not a record worth
    /// surviving a restart.
    pub greenroom_queues: Arc<RwLock<std::collections::HashMap<Uuid, serde_json::Value>>>,
}

impl BusState {
    pub fn new(db: Database, config: &'static AppConfig, sfu: Arc<SfuOrchestrator>, mixer: Arc<MixCoordinator>) -> Self {
        Self {
            db,
            config,
            hub: Arc::new(Hub::new()),
            sfu,
            mixer,
            greenroom_queues: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }
}

/// ICE server configuration returned in `room:join`/`host:admit` replies
/// (§4.2, §6). Issuing TURN credentials is someone else's problem (§1
/// Non-goals exclude HTTP request routing); this is the same public STUN
/// fallback every client can reach without a short-lived credential.
pub fn ice_servers() -> serde_json::Value {
    json!([{ "urls": ["stun:stun.l.google.com:19302"] }])
}

pub fn build_router(state: BusState) -> Router {
    Router::new().route("/call-center", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<BusState>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: BusState) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let (mailbox_tx, mut mailbox_rx) = mpsc::unbounded_channel::<RoomEvent>();
    let forward_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = mailbox_rx.recv().await {
            let frame = BroadcastEnvelope { event: event.event, data: event.data };
            let Ok(text) = serde_json::to_string(&frame) else { continue };
            if forward_tx.send(Message::Text(text.into())).is_err() {
                break;
            }
        }
    });

    let mut session = SessionState::new(mailbox_tx);

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            if matches!(message, Message::Close(_)) {
                break;
            }
            continue;
        };

        let envelope: ClientEnvelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "malformed client envelope");
                continue;
            }
        };
        let request_id = envelope.request_id.clone();

        let reply = match dispatch(&state, &mut session, &envelope.event, envelope.data).await {
            Ok(data) => ReplyEnvelope::ok(request_id, data),
            Err(err) => ReplyEnvelope::err(request_id, err.reply_message()),
        };
        if let Ok(text) = serde_json::to_string(&reply) {
            if out_tx.send(Message::Text(text.into())).is_err() {
                break;
            }
        }

        if matches!(session.phase, SessionPhase::Disconnected) {
            break;
        }
    }

    handlers::room::leave(&state, &mut session).await;
    forwarder.abort();
    drop(out_tx);
    let _ = writer.await;
}

/// Routes one `ClientEnvelope` to its handler (§4.2 event-class table).
/// `room:join` is the only event permitted before the session has joined a
/// room; everything else requires `phase != CONNECTED_UNJOINED`.
async fn dispatch(state: &BusState, session: &mut SessionState, event: &str, data: serde_json::Value) -> Result<serde_json::Value, RoomBusError> {
    if matches!(session.phase, SessionPhase::ConnectedUnjoined) && event != "room:join" {
        return Err(RoomBusError::Forbidden);
    }

    match event {
        "room:join" => handlers::room::join(state, session, data).await,
        "room:leave" => {
            handlers::room::leave(state, session).await;
            Ok(json!({}))
        }

        "transport:create" => handlers::media::transport_create(state, session, data).await,
        "transport:connect" => handlers::media::transport_connect(state, session, data).await,
        "producer:create" => handlers::media::producer_create(state, session, data).await,
        "consumer:create" => handlers::media::consumer_create(state, session, data).await,
        "consumer:resume" => handlers::media::consumer_resume(state, session, data).await,

        "vad:speaking" => handlers::presence::vad_speaking(state, session, data).await,
        "mute:update" => handlers::presence::mute_update(state, session, data).await,
        "tally:update" => handlers::presence::tally_update(state, session, data).await,

        "host:kick" => handlers::host::kick(state, session, data).await,
        "host:close-room" => handlers::host::close_room(state, session).await,
        "host:admit" => handlers::host::admit(state, session, data).await,
        "host:reject" => handlers::host::reject(state, session, data).await,

        "cue:send" => handlers::cues::send(state, session, data).await,
        "cue:clear" => handlers::cues::clear(state, session, data).await,

        "chat:send" => handlers::chat::send(state, session, data).await,
        "chat:history" => handlers::chat::history(state, session, data).await,

        "timer:create" => handlers::timers::create(state, session, data).await,
        "timer:start" => handlers::timers::start(state, session, data).await,
        "timer:pause" => handlers::timers::pause(state, session, data).await,
        "timer:reset" => handlers::timers::reset(state, session, data).await,
        "timer:delete" => handlers::timers::delete(state, session, data).await,
        "timer:list" => handlers::timers::list(state, session).await,

        "rundown:set-current" => handlers::rundown::set_current(state, session, data).await,
        "rundown:get" => handlers::rundown::get(state, data).await,

        "recording:start" => handlers::recording::start(state, session).await,
        "recording:stop" => handlers::recording::stop(state, session, data).await,
        "recording:list" => handlers::recording::list(state, session).await,

        "talkback:create-group" => handlers::ifb::create_group(state, session, data).await,
        "talkback:update-group" => handlers::ifb::update_group(state, session, data).await,
        "talkback:delete-group" => handlers::ifb::delete_group(state, session, data).await,
        "talkback:add-member" => handlers::ifb::add_member(state, session, data).await,
        "talkback:remove-member" => handlers::ifb::remove_member(state, session, data).await,
        "talkback:list-groups" => handlers::ifb::list_groups(state, session).await,
        "ifb:start" => handlers::ifb::start(state, session, data).await,
        "ifb:update" => handlers::ifb::update(state, session, data).await,
        "ifb:end" => handlers::ifb::end(state, session, data).await,
        "ifb:list" => handlers::ifb::list(state, session).await,

        "remote:set-gain" => handlers::remote::set_gain(state, session, data).await,
        "remote:set-mute" => handlers::remote::set_mute(state, session, data).await,
        "remote:set-eq" => handlers::remote::set_eq(state, session, data).await,
        "remote:set-compressor" => handlers::remote::set_compressor(state, session, data).await,
        "remote:set-gate" => handlers::remote::set_gate(state, session, data).await,
        "remote:reset" => handlers::remote::reset(state, session, data).await,
        "remote:get-state" => handlers::remote::get_state(state, session, data).await,
        "remote:state-response" => handlers::remote::state_response(state, session, data).await,

        "greenroom:create" => handlers::greenroom::create(state, session, data).await,
        "greenroom:delete" => handlers::greenroom::delete(state, session, data).await,
        "greenroom:list" => handlers::greenroom::list(state, session).await,
        "greenroom:move-participant" => handlers::greenroom::move_participant(state, session, data).await,
        "greenroom:update-queue" => handlers::greenroom::update_queue(state, session, data).await,
        "greenroom:countdown" => handlers::greenroom::countdown(state, session, data).await,
        "greenroom:get-queue" => handlers::greenroom::get_queue(state, session, data).await,

        "mix:register" => handlers::mix::register(state, session).await,
        "mix:heartbeat" => handlers::mix::heartbeat(state, session).await,
        "mix:state-change" => handlers::mix::state_change(state, session, data).await,
        "mix:full-sync" => handlers::mix::full_sync(state, session, data).await,
        "mix:add-channel" => handlers::mix::add_channel(state, session, data).await,
        "mix:remove-channel" => handlers::mix::remove_channel(state, session, data).await,
        "mix:get-state" => handlers::mix::get_state(state, session).await,
        "mix:takeover" => handlers::mix::takeover(state, session).await,
        "mix:persist" => handlers::mix::persist(state, session).await,

        other => Err(RoomBusError::Validation { message: format!("unknown event {other}") }),
    }
}
