//! `EncoderSupervisor` (§4.4) — owns every encoder child process, retries
//! failed spawns with a capped backoff, and debounces bus-level changes into
//! a restart.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use roombus_common::config::EgressConfig;
use roombus_common::models::audio_output::AudioOutput;
use roombus_common::process::{retry_delay, tail_stderr, terminate_gracefully, ProcessSignal};
use roombus_db::Database;
use roombus_sfu::SfuOrchestrator;

use crate::args::{encoder_args, build_sdp, BusInput};
use crate::error::EgressError;
use crate::event::{EgressEvent, EncoderState};

struct RunningEncoder {
    room_id: Uuid,
    stop_tx: Option<oneshot::Sender<()>>,
    debounce_cancel: Option<oneshot::Sender<()>>,
    bus_routing: HashMap<String, f32>,
}

#[derive(Debug, serde::Serialize)]
pub struct EgressStats {
    pub active_encoders: usize,
    pub total_retries: u32,
}

pub struct EncoderSupervisor {
    sfu: Arc<SfuOrchestrator>,
    db: Database,
    config: EgressConfig,
    running: Arc<Mutex<HashMap<Uuid, RunningEncoder>>>,
    events_tx: mpsc::UnboundedSender<EgressEvent>,
    total_retries: Arc<AtomicU32>,
}

fn plain_transport_key(output_id: Uuid, bus: &str) -> String {
    format!("output:{output_id}:{bus}")
}

fn primary_bus(bus_routing: &HashMap<String, f32>) -> String {
    bus_routing
        .iter()
        .filter(|(_, gain)| **gain > 0.0)
        .map(|(bus, _)| bus.clone())
        .next()
        .unwrap_or_else(|| "pgm".to_string())
}

impl EncoderSupervisor {
    pub fn new(
        sfu: Arc<SfuOrchestrator>,
        db: Database,
        config: EgressConfig,
    ) -> (Self, mpsc::UnboundedReceiver<EgressEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                sfu,
                db,
                config,
                running: Arc::new(Mutex::new(HashMap::new())),
                events_tx,
                total_retries: Arc::new(AtomicU32::new(0)),
            },
            events_rx,
        )
    }

    fn emit(&self, event: EgressEvent) {
        let _ = self.events_tx.send(event);
    }

    /// §4.4 `startEncoder(outputId, roomId, producerId)` — idempotent.
    pub async fn start_encoder(
        &self,
        output_id: Uuid,
        room_id: Uuid,
        producer_id: Uuid,
    ) -> Result<(), EgressError> {
        if self.running.lock().await.contains_key(&output_id) {
            tracing::info!(output = %output_id, "startEncoder: already running, no-op");
            return Ok(());
        }

        let output = roombus_db::repository::audio_outputs::find_by_id(&self.db.pool, output_id)
            .await?
            .ok_or(EgressError::OutputNotFound(output_id))?;

        let bus = primary_bus(&output.bus_routing);
        let gain = output.bus_routing.get(&bus).copied().unwrap_or(1.0);
        self.spawn_for_buses(output_id, room_id, &output, vec![(bus, producer_id, gain)]).await
    }

    /// §4.4 `startMultiBusEncoder(outputId, roomId, busProducers)` —
    /// falls back to `startEncoder`'s single-bus path when only one bus has
    /// non-zero level.
    pub async fn start_multi_bus_encoder(
        &self,
        output_id: Uuid,
        room_id: Uuid,
        bus_producers: HashMap<String, Uuid>,
    ) -> Result<(), EgressError> {
        if self.running.lock().await.contains_key(&output_id) {
            tracing::info!(output = %output_id, "startMultiBusEncoder: already running, no-op");
            return Ok(());
        }

        let output = roombus_db::repository::audio_outputs::find_by_id(&self.db.pool, output_id)
            .await?
            .ok_or(EgressError::OutputNotFound(output_id))?;

        let active: Vec<(String, Uuid, f32)> = output
            .bus_routing
            .iter()
            .filter(|(_, gain)| **gain > 0.0)
            .filter_map(|(bus, gain)| bus_producers.get(bus).map(|pid| (bus.clone(), *pid, *gain)))
            .collect();

        if active.is_empty() {
            return Err(EgressError::OutputNotFound(output_id));
        }
        self.spawn_for_buses(output_id, room_id, &output, active).await
    }

    async fn spawn_for_buses(
        &self,
        output_id: Uuid,
        room_id: Uuid,
        output: &AudioOutput,
        buses: Vec<(String, Uuid, f32)>,
    ) -> Result<(), EgressError> {
        let mut inputs = Vec::with_capacity(buses.len());
        for (bus, producer_id, gain) in &buses {
            let key = plain_transport_key(output_id, bus);
            let (_local, external) = self.sfu.create_plain_transport(room_id, key.clone()).await?;
            let encoder_addr: SocketAddr = format!("127.0.0.1:{external}").parse().expect("valid loopback addr");
            self.sfu.consume_with_plain_transport(room_id, &key, encoder_addr).await?;
            let _ = producer_id;
            inputs.push(BusInput { bus: bus.clone(), port: external, gain: *gain });
        }

        let args = encoder_args(
            &output.config,
            output.codec,
            output.bitrate_kbps,
            output.sample_rate,
            output.channels,
            &inputs,
        )
        .map_err(EgressError::SpawnFailed)?;
        let sdp = build_sdp(&inputs);

        let bus_routing: HashMap<String, f32> = buses.iter().map(|(b, _, g)| (b.clone(), *g)).collect();
        self.launch(output_id, room_id, args, sdp, bus_routing, 0).await
    }

    async fn launch(
        &self,
        output_id: Uuid,
        room_id: Uuid,
        args: Vec<String>,
        sdp: String,
        bus_routing: HashMap<String, f32>,
        retry_count: u32,
    ) -> Result<(), EgressError> {
        let (stop_tx, stop_rx) = oneshot::channel();
        self.running.lock().await.insert(
            output_id,
            RunningEncoder { room_id, stop_tx: Some(stop_tx), debounce_cancel: None, bus_routing: bus_routing.clone() },
        );

        self.emit(EgressEvent::StateChanged { room_id, output_id, state: EncoderState::Starting, error: None });
        roombus_db::repository::audio_outputs::set_connection_state(&self.db.pool, output_id, true, false, None)
            .await?;

        let db = self.db.clone();
        let config = self.config.clone();
        let events_tx = self.events_tx.clone();
        let running = self.running.clone();
        let total_retries = self.total_retries.clone();
        let grace = Duration::from_millis(config.stop_grace_period_ms);
        let delays = config.retry_delays_secs.clone();

        tokio::spawn(async move {
            run_encoder(
                output_id,
                room_id,
                args,
                sdp,
                retry_count,
                delays,
                grace,
                db,
                events_tx,
                stop_rx,
                running,
                total_retries,
            )
            .await;
        });

        Ok(())
    }

    /// §4.4 `stopEncoder(outputId)` — cancels any pending debounced restart,
    /// sends graceful termination, waits `stop_grace_period_ms`, force-kills.
    pub async fn stop_encoder(&self, output_id: Uuid) -> Result<(), EgressError> {
        let mut running = self.running.lock().await;
        let Some(mut entry) = running.remove(&output_id) else {
            return Err(EgressError::NotRunning(output_id));
        };
        if let Some(cancel) = entry.debounce_cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(stop_tx) = entry.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        drop(running);

        roombus_db::repository::audio_outputs::set_connection_state(&self.db.pool, output_id, false, false, None)
            .await?;
        Ok(())
    }

    /// §4.4 `updateBusLevels` — three-step protocol: broadcast immediately,
    /// persist, then debounce a restart.
    pub async fn update_bus_levels(
        &self,
        output_id: Uuid,
        room_id: Uuid,
        bus_routing: HashMap<String, f32>,
        changed_by: Option<Uuid>,
    ) -> Result<(), EgressError> {
        self.emit(EgressEvent::BusLevelsChanged {
            room_id,
            output_id,
            bus_routing: bus_routing.clone(),
            changed_by,
        });
        roombus_db::repository::audio_outputs::update_bus_routing(&self.db.pool, output_id, &bus_routing).await?;

        let mut running = self.running.lock().await;
        let Some(entry) = running.get_mut(&output_id) else {
            return Ok(());
        };
        if let Some(cancel) = entry.debounce_cancel.take() {
            let _ = cancel.send(());
        }
        entry.bus_routing = bus_routing;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        entry.debounce_cancel = Some(cancel_tx);
        drop(running);

        let debounce = Duration::from_millis(self.config.bus_level_debounce_ms);
        let events_tx = self.events_tx.clone();

        // The debounce timer itself doesn't restart the encoder here — it
        // only announces the `restarting` transition. The caller (room
        // bus) re-invokes `start_multi_bus_encoder`/`start_encoder` after
        // `stop_encoder` once this timer fires, mirroring `updateBusLevels`'s
        // "stop the current encoder and start a new one" step.
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => {
                    let _ = events_tx.send(EgressEvent::StateChanged {
                        room_id,
                        output_id,
                        state: EncoderState::Restarting,
                        error: None,
                    });
                }
                _ = cancel_rx => {}
            }
        });
        Ok(())
    }

    /// §4.4 `waitForBusProducer` — bounded poll via the orchestrator.
    pub async fn wait_for_bus_producer(
        &self,
        room_id: Uuid,
        bus_type: &str,
        max_retries: u32,
        interval_ms: u64,
    ) -> Result<Option<(Uuid, Uuid)>, EgressError> {
        for attempt in 0..=max_retries {
            if let Some(found) = self.sfu.get_bus_producer(room_id, bus_type).await? {
                return Ok(Some(found));
            }
            if attempt < max_retries {
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
        Ok(None)
    }

    pub async fn stats(&self) -> EgressStats {
        EgressStats {
            active_encoders: self.running.lock().await.len(),
            total_retries: self.total_retries.load(Ordering::Relaxed),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_encoder(
    output_id: Uuid,
    room_id: Uuid,
    args: Vec<String>,
    sdp: String,
    mut retry_count: u32,
    delays: Vec<u64>,
    grace: Duration,
    db: Database,
    events_tx: mpsc::UnboundedSender<EgressEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    running: Arc<Mutex<HashMap<Uuid, RunningEncoder>>>,
    total_retries: Arc<AtomicU32>,
) {
    loop {
        let mut child = match spawn_ffmpeg(&args, &sdp).await {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(output = %output_id, error = %e, "ffmpeg spawn failed");
                let _ = events_tx.send(EgressEvent::StateChanged {
                    room_id,
                    output_id,
                    state: EncoderState::Error,
                    error: Some(e.to_string()),
                });
                let _ = roombus_db::repository::audio_outputs::set_connection_state(
                    &db.pool,
                    output_id,
                    false,
                    false,
                    Some(&e.to_string()),
                )
                .await;
                running.lock().await.remove(&output_id);
                return;
            }
        };

        let _ = events_tx.send(EgressEvent::StateChanged {
            room_id,
            output_id,
            state: EncoderState::Running,
            error: None,
        });
        let _ = roombus_db::repository::audio_outputs::set_connection_state(&db.pool, output_id, true, true, None)
            .await;

        let mut signals = tail_stderr(&mut child);
        let exit_status = loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    let _ = terminate_gracefully(&mut child, grace).await;
                    let _ = events_tx.send(EgressEvent::StateChanged {
                        room_id,
                        output_id,
                        state: EncoderState::Stopped,
                        error: None,
                    });
                    running.lock().await.remove(&output_id);
                    return;
                }
                status = child.wait() => {
                    break status.unwrap_or_default();
                }
                signal = signals.recv() => {
                    match signal {
                        Some(ProcessSignal::Progress) => continue,
                        Some(ProcessSignal::ErrorToken(line)) => {
                            tracing::warn!(output = %output_id, %line, "encoder stderr error token");
                        }
                        None | Some(ProcessSignal::Exited(_)) => continue,
                    }
                }
            }
        };

        if exit_status.success() {
            let _ = events_tx.send(EgressEvent::StateChanged {
                room_id,
                output_id,
                state: EncoderState::Stopped,
                error: None,
            });
            let _ = roombus_db::repository::audio_outputs::set_connection_state(&db.pool, output_id, false, false, None)
                .await;
            running.lock().await.remove(&output_id);
            return;
        }

        if retry_count as usize >= delays.len() {
            let message = format!("encoder exited with {exit_status}");
            let _ = events_tx.send(EgressEvent::StateChanged {
                room_id,
                output_id,
                state: EncoderState::Error,
                error: Some(message.clone()),
            });
            let _ = roombus_db::repository::audio_outputs::set_connection_state(
                &db.pool,
                output_id,
                false,
                false,
                Some(&message),
            )
            .await;
            running.lock().await.remove(&output_id);
            return;
        }

        retry_count += 1;
        total_retries.fetch_add(1, Ordering::Relaxed);
        let _ = roombus_db::repository::audio_outputs::record_retry(&db.pool, output_id, retry_count as i32).await;
        let delay = retry_delay(retry_count as usize - 1, &delays);
        tracing::info!(output = %output_id, attempt = retry_count, delay_secs = delay.as_secs(), "retrying encoder");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut stop_rx => {
                let _ = events_tx.send(EgressEvent::StateChanged {
                    room_id,
                    output_id,
                    state: EncoderState::Stopped,
                    error: None,
                });
                running.lock().await.remove(&output_id);
                return;
            }
        }
    }
}

async fn spawn_ffmpeg(args: &[String], sdp: &str) -> std::io::Result<Child> {
    let mut child = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(sdp.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    Ok(child)
}
