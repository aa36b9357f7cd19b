//! `IngestSupervisor` (§4.5) — owns every SRT/RIST ingest child process,
//! allocates LISTENER-mode ports, and watches connection/progress
//! watchdogs. Symmetric to `roombus_egress::supervisor::EncoderSupervisor`;
//! WHIP sessions are handled separately by `whip::WhipSupervisor` since they
//! terminate WebRTC directly rather than spawning a child.

use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use roombus_common::config::IngestConfig;
use roombus_common::models::audio_source::{AudioSourceConfig, ConnectionState, SourceTransportMode};
use roombus_common::process::{tail_stderr, terminate_gracefully, ProcessSignal};
use roombus_db::Database;
use roombus_sfu::SfuOrchestrator;

use crate::args::{rist_args, srt_args};
use crate::error::IngestError;
use crate::event::IngestEvent;
use crate::port_pool;

struct RunningSource {
    stop_tx: Option<oneshot::Sender<()>>,
}

#[derive(Debug, serde::Serialize)]
pub struct IngestStats {
    pub active_sources: usize,
}

pub struct IngestSupervisor {
    sfu: Arc<SfuOrchestrator>,
    db: Database,
    config: IngestConfig,
    running: Arc<Mutex<HashMap<Uuid, RunningSource>>>,
    events_tx: mpsc::UnboundedSender<IngestEvent>,
}

impl IngestSupervisor {
    pub fn new(
        sfu: Arc<SfuOrchestrator>,
        db: Database,
        config: IngestConfig,
    ) -> (Self, mpsc::UnboundedReceiver<IngestEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self { sfu, db, config, running: Arc::new(Mutex::new(HashMap::new())), events_tx },
            events_rx,
        )
    }

    fn emit(&self, event: IngestEvent) {
        let _ = self.events_tx.send(event);
    }

    /// §4.5 "per-source-type flow" for SRT/RIST sources — idempotent.
    pub async fn start_source(&self, source_id: Uuid, room_id: Uuid) -> Result<(), IngestError> {
        if self.running.lock().await.contains_key(&source_id) {
            tracing::info!(source = %source_id, "startSource: already running, no-op");
            return Ok(());
        }

        let source = roombus_db::repository::audio_sources::find_by_id(&self.db.pool, source_id)
            .await?
            .ok_or(IngestError::SourceNotFound(source_id))?;

        let args = match &source.config {
            AudioSourceConfig::SrtStream { mode, host, port, stream_id, passphrase, latency_ms } => {
                let port = self.resolve_port(source_id, *mode, *port, self.config.srt_port_min, self.config.srt_port_max).await?;
                let rtp_port = self.sfu.create_plain_transport_for_producer(room_id, source_id).await?;
                srt_args(*mode, host.as_deref(), port, stream_id.as_deref(), passphrase.as_deref(), *latency_ms, rtp_port)
                    .map_err(IngestError::InvalidConfig)?
            }
            AudioSourceConfig::RistStream { mode, host, port } => {
                let port = self.resolve_port(source_id, *mode, *port, self.config.rist_port_min, self.config.rist_port_max).await?;
                let rtp_port = self.sfu.create_plain_transport_for_producer(room_id, source_id).await?;
                rist_args(*mode, host.as_deref(), port, rtp_port).map_err(IngestError::InvalidConfig)?
            }
            other => {
                return Err(IngestError::InvalidConfig(format!(
                    "{other:?} does not use the child-process ingest pipeline"
                )))
            }
        };

        let initial_state = match &source.config {
            AudioSourceConfig::SrtStream { mode: SourceTransportMode::Listener, .. }
            | AudioSourceConfig::RistStream { mode: SourceTransportMode::Listener, .. } => ConnectionState::Listening,
            _ => ConnectionState::Connecting,
        };

        self.launch(source_id, room_id, args, initial_state).await
    }

    /// Resolves the port a LISTENER-mode source binds on, allocating a new
    /// one if it doesn't already hold one; returns the caller-supplied port
    /// unchanged for CALLER mode (validating it's set).
    async fn resolve_port(
        &self,
        source_id: Uuid,
        mode: SourceTransportMode,
        configured_port: Option<u16>,
        range_min: u16,
        range_max: u16,
    ) -> Result<Option<u16>, IngestError> {
        match mode {
            SourceTransportMode::Caller => {
                if configured_port.is_none() {
                    return Err(IngestError::InvalidConfig("caller-mode source requires a port".into()));
                }
                Ok(configured_port)
            }
            SourceTransportMode::Listener => {
                if let Some(port) = configured_port {
                    return Ok(Some(port));
                }
                let taken: HashSet<u16> = roombus_db::repository::audio_sources::list_allocated_ports(&self.db.pool)
                    .await?
                    .into_iter()
                    .map(|p| p as u16)
                    .collect();
                let port = port_pool::allocate_port(range_min, range_max, taken)
                    .await
                    .ok_or(IngestError::PortsExhausted)?;
                roombus_db::repository::audio_sources::allocate_port(&self.db.pool, source_id, port, None).await?;
                Ok(Some(port))
            }
        }
    }

    async fn launch(
        &self,
        source_id: Uuid,
        room_id: Uuid,
        args: Vec<String>,
        initial_state: ConnectionState,
    ) -> Result<(), IngestError> {
        let (stop_tx, stop_rx) = oneshot::channel();
        self.running.lock().await.insert(source_id, RunningSource { stop_tx: Some(stop_tx) });

        self.emit(IngestEvent::ConnectionStateChanged { room_id, source_id, state: initial_state, error: None });
        roombus_db::repository::audio_sources::set_connection_state(&self.db.pool, source_id, initial_state, None)
            .await?;

        let db = self.db.clone();
        let sfu = self.sfu.clone();
        let events_tx = self.events_tx.clone();
        let running = self.running.clone();
        let connection_timeout = Duration::from_secs(self.config.connection_timeout_secs);
        let progress_timeout = Duration::from_secs(self.config.progress_timeout_secs);

        tokio::spawn(async move {
            run_source(source_id, room_id, args, connection_timeout, progress_timeout, db, sfu, events_tx, stop_rx, running)
                .await;
        });

        Ok(())
    }

    /// §4.5 `stopSource` — graceful-then-kill, mirrors `stopEncoder`.
    pub async fn stop_source(&self, source_id: Uuid) -> Result<(), IngestError> {
        let mut running = self.running.lock().await;
        let Some(mut entry) = running.remove(&source_id) else {
            return Err(IngestError::NotRunning(source_id));
        };
        if let Some(stop_tx) = entry.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        Ok(())
    }

    pub async fn stats(&self) -> IngestStats {
        IngestStats { active_sources: self.running.lock().await.len() }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_source(
    source_id: Uuid,
    room_id: Uuid,
    args: Vec<String>,
    connection_timeout: Duration,
    progress_timeout: Duration,
    db: Database,
    sfu: Arc<SfuOrchestrator>,
    events_tx: mpsc::UnboundedSender<IngestEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    running: Arc<Mutex<HashMap<Uuid, RunningSource>>>,
) {
    let grace = Duration::from_millis(500);

    let mut child = match spawn_ingest(&args).await {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(source = %source_id, error = %e, "ingest spawn failed");
            finish_error(&db, &events_tx, &running, room_id, source_id, e.to_string()).await;
            return;
        }
    };

    let mut signals = tail_stderr(&mut child);
    let mut connected = false;
    let mut deadline = Instant::now() + connection_timeout;

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                let _ = terminate_gracefully(&mut child, grace).await;
                let _ = roombus_db::repository::audio_sources::release_port(&db.pool, source_id).await;
                let _ = sfu.close_participant(room_id, source_id).await;
                let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
                    room_id, source_id, state: ConnectionState::Disconnected, error: None,
                });
                let _ = roombus_db::repository::audio_sources::set_connection_state(
                    &db.pool, source_id, ConnectionState::Disconnected, None,
                ).await;
                return;
            }
            status = child.wait() => {
                let status = status.unwrap_or_default();
                let _ = roombus_db::repository::audio_sources::release_port(&db.pool, source_id).await;
                let _ = sfu.close_participant(room_id, source_id).await;
                running.lock().await.remove(&source_id);
                if connected && status.success() {
                    let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
                        room_id, source_id, state: ConnectionState::Disconnected, error: None,
                    });
                    let _ = roombus_db::repository::audio_sources::set_connection_state(
                        &db.pool, source_id, ConnectionState::Disconnected, None,
                    ).await;
                } else {
                    let message = format!("ingest process exited with {status}");
                    let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
                        room_id, source_id, state: ConnectionState::Error, error: Some(message.clone()),
                    });
                    let _ = roombus_db::repository::audio_sources::set_connection_state(
                        &db.pool, source_id, ConnectionState::Error, Some(&message),
                    ).await;
                }
                return;
            }
            signal = signals.recv() => {
                match signal {
                    Some(ProcessSignal::Progress) => {
                        deadline = Instant::now() + progress_timeout;
                        if !connected {
                            match sfu.create_producer_on_plain_transport(room_id, source_id, format!("source:{source_id}")).await {
                                Ok(record) => {
                                    connected = true;
                                    let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
                                        room_id, source_id, state: ConnectionState::Connected, error: None,
                                    });
                                    let _ = roombus_db::repository::audio_sources::set_connection_state(
                                        &db.pool, source_id, ConnectionState::Connected, None,
                                    ).await;
                                    let _ = events_tx.send(IngestEvent::ProducerReady {
                                        room_id, source_id, producer_id: record.id,
                                    });
                                }
                                Err(e) => {
                                    tracing::error!(source = %source_id, error = %e, "failed to create ingest producer");
                                }
                            }
                        }
                    }
                    Some(ProcessSignal::ErrorToken(line)) => {
                        tracing::warn!(source = %source_id, %line, "ingest stderr error token");
                    }
                    None | Some(ProcessSignal::Exited(_)) => continue,
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                let _ = terminate_gracefully(&mut child, grace).await;
                let _ = roombus_db::repository::audio_sources::release_port(&db.pool, source_id).await;
                let _ = sfu.close_participant(room_id, source_id).await;
                running.lock().await.remove(&source_id);
                let message = if connected { "progress timeout" } else { "connection timeout" };
                let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
                    room_id, source_id, state: ConnectionState::Error, error: Some(message.to_string()),
                });
                let _ = roombus_db::repository::audio_sources::set_connection_state(
                    &db.pool, source_id, ConnectionState::Error, Some(message),
                ).await;
                return;
            }
        }
    }
}

async fn finish_error(
    db: &Database,
    events_tx: &mpsc::UnboundedSender<IngestEvent>,
    running: &Arc<Mutex<HashMap<Uuid, RunningSource>>>,
    room_id: Uuid,
    source_id: Uuid,
    message: String,
) {
    let _ = events_tx.send(IngestEvent::ConnectionStateChanged {
        room_id,
        source_id,
        state: ConnectionState::Error,
        error: Some(message.clone()),
    });
    let _ = roombus_db::repository::audio_sources::set_connection_state(&db.pool, source_id, ConnectionState::Error, Some(&message))
        .await;
    running.lock().await.remove(&source_id);
}

async fn spawn_ingest(args: &[String]) -> std::io::Result<Child> {
    Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}
