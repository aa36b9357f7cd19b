//! In-memory mix coordinator state (§4.3).
//!
//! One entry per room, guarded by its own `Mutex` so operations against
//! different rooms never block each other while all mutations to the same
//! room's mix state serialize (§5 "Per-room mix lock").

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use roombus_common::models::mix_state::{ChannelId, ChannelMix, MixChangeType, MixStateChange, RoomMixState};

use crate::error::MixerError;

struct RoomEntry {
    state: RoomMixState,
    primary_client_id: Option<Uuid>,
    last_heartbeat: Option<Instant>,
}

impl RoomEntry {
    fn new() -> Self {
        Self {
            state: RoomMixState::default(),
            primary_client_id: None,
            last_heartbeat: None,
        }
    }

    fn is_primary_alive(&self, window: Duration) -> bool {
        match (self.primary_client_id, self.last_heartbeat) {
            (Some(_), Some(last)) => last.elapsed() < window,
            _ => false,
        }
    }
}

pub struct MixCoordinator {
    /// `FAILOVER_TIMEOUT` / heartbeat window (§4.3, §8) — a primary missing
    /// a heartbeat for this long may be displaced by `registerPrimaryClient`
    /// or `takeover`.
    heartbeat_window: Duration,
    rooms: RwLock<HashMap<Uuid, Arc<Mutex<RoomEntry>>>>,
    rooms_initialized: AtomicU64,
}

#[derive(Debug, serde::Serialize)]
pub struct MixerStats {
    pub active_rooms: usize,
    pub rooms_with_primary: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailoverStatus {
    pub needs_failover: bool,
    pub has_channels: bool,
}

impl MixCoordinator {
    pub fn new(heartbeat_window_secs: u64) -> Self {
        Self {
            heartbeat_window: Duration::from_secs(heartbeat_window_secs),
            rooms: RwLock::new(HashMap::new()),
            rooms_initialized: AtomicU64::new(0),
        }
    }

    async fn entry(&self, room_id: Uuid) -> Arc<Mutex<RoomEntry>> {
        if let Some(e) = self.rooms.read().await.get(&room_id) {
            return e.clone();
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| {
                self.rooms_initialized.fetch_add(1, Ordering::Relaxed);
                Arc::new(Mutex::new(RoomEntry::new()))
            })
            .clone()
    }

    /// §4.3 `initRoom(roomId)` — idempotent; installs default master block
    /// and empty channels.
    pub async fn init_room(&self, room_id: Uuid) {
        self.entry(room_id).await;
    }

    /// §4.3 `registerPrimaryClient` — succeeds if no current primary, or
    /// the current primary has missed its heartbeat window.
    pub async fn register_primary_client(&self, room_id: Uuid, client_id: Uuid) -> Result<(), MixerError> {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        if guard.is_primary_alive(self.heartbeat_window) && guard.primary_client_id != Some(client_id) {
            return Err(MixerError::PrimaryAlreadyRegistered(room_id));
        }
        guard.primary_client_id = Some(client_id);
        guard.last_heartbeat = Some(Instant::now());
        Ok(())
    }

    /// §4.3 `heartbeat` — accepted only if `clientId` is the current
    /// primary.
    pub async fn heartbeat(&self, room_id: Uuid, client_id: Uuid) -> Result<(), MixerError> {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        if guard.primary_client_id != Some(client_id) {
            return Err(MixerError::NotPrimary { room: room_id, client: client_id });
        }
        guard.last_heartbeat = Some(Instant::now());
        Ok(())
    }

    /// §4.3 `mix:takeover` (§4.2, §8 scenario 3) — a new primary may only
    /// install itself once the previous one has missed its heartbeat
    /// window. Returns the previous primary, if any, for the broadcast
    /// payload.
    pub async fn takeover(&self, room_id: Uuid, new_client_id: Uuid) -> Result<Option<Uuid>, MixerError> {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        if guard.is_primary_alive(self.heartbeat_window) {
            return Err(MixerError::PrimaryAlreadyRegistered(room_id));
        }
        let previous = guard.primary_client_id;
        guard.primary_client_id = Some(new_client_id);
        guard.last_heartbeat = Some(Instant::now());
        Ok(previous)
    }

    fn check_primary(guard: &RoomEntry, client_id: Uuid, room_id: Uuid) -> Result<(), MixerError> {
        if guard.primary_client_id != Some(client_id) {
            return Err(MixerError::NotPrimary { room: room_id, client: client_id });
        }
        Ok(())
    }

    /// §4.3 `applyStateChange` — rejected unless `clientId` is the current
    /// primary.
    pub async fn apply_state_change(
        &self,
        room_id: Uuid,
        client_id: Uuid,
        change: &MixStateChange,
    ) -> Result<RoomMixState, MixerError> {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        Self::check_primary(&guard, client_id, room_id)?;

        match change.change_type {
            MixChangeType::Channel => {
                let channel_id = change
                    .channel_id
                    .clone()
                    .ok_or_else(|| MixerError::ChannelNotFound(String::new()))?;
                let entry = guard.state.channels.entry(channel_id).or_insert_with(ChannelMix::default);
                merge_channel(entry, &change.changes);
            }
            MixChangeType::Master => {
                merge_master(&mut guard.state.master, &change.changes);
            }
            MixChangeType::Routing => {
                let channel_id = change
                    .channel_id
                    .clone()
                    .ok_or_else(|| MixerError::ChannelNotFound(String::new()))?;
                let entry = guard.state.channels.entry(channel_id).or_insert_with(ChannelMix::default);
                if let Some(routing) = change.changes.as_object() {
                    for (bus, v) in routing {
                        if let Some(b) = v.as_bool() {
                            entry.routing.insert(bus.clone(), b);
                        }
                    }
                }
            }
            MixChangeType::Full => {
                if let Some(channels) = change.changes.get("channels") {
                    if let Ok(parsed) = serde_json::from_value(channels.clone()) {
                        guard.state.channels = parsed;
                    }
                }
                if let Some(master) = change.changes.get("master") {
                    if let Ok(parsed) = serde_json::from_value(master.clone()) {
                        guard.state.master = parsed;
                    }
                }
            }
        }
        guard.state.last_updated = Some(Utc::now());
        Ok(guard.state.clone())
    }

    /// §4.3 `syncFullState` — same authorization; replaces
    /// `channels`/`master`/`soloMode` fields present in `partial`.
    pub async fn sync_full_state(
        &self,
        room_id: Uuid,
        client_id: Uuid,
        partial: serde_json::Value,
    ) -> Result<RoomMixState, MixerError> {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        Self::check_primary(&guard, client_id, room_id)?;

        if let Some(channels) = partial.get("channels") {
            if let Ok(parsed) = serde_json::from_value(channels.clone()) {
                guard.state.channels = parsed;
            }
        }
        if let Some(master) = partial.get("master") {
            if let Ok(parsed) = serde_json::from_value(master.clone()) {
                guard.state.master = parsed;
            }
        }
        if let Some(solo) = partial.get("soloMode").and_then(|v| v.as_bool()) {
            guard.state.solo_mode = solo;
        }
        guard.state.last_updated = Some(Utc::now());
        Ok(guard.state.clone())
    }

    /// §4.3 `addChannel` / `removeChannel` — manipulate the channel map
    /// without requiring primary; channel membership tracks SFU joins and
    /// leaves, not mixer authority. `addChannel` twice is idempotent
    /// (§8 "Round-trip and idempotence laws").
    pub async fn add_channel(&self, room_id: Uuid, channel_id: ChannelId) -> RoomMixState {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        guard.state.channels.entry(channel_id).or_insert_with(ChannelMix::default);
        guard.state.last_updated = Some(Utc::now());
        guard.state.clone()
    }

    pub async fn remove_channel(&self, room_id: Uuid, channel_id: &str) -> RoomMixState {
        let entry = self.entry(room_id).await;
        let mut guard = entry.lock().await;
        guard.state.channels.remove(channel_id);
        guard.state.last_updated = Some(Utc::now());
        guard.state.clone()
    }

    pub async fn get_state(&self, room_id: Uuid) -> RoomMixState {
        let entry = self.entry(room_id).await;
        entry.lock().await.state.clone()
    }

    /// §4.3 `persistState` — snapshot for `Room.mixState` (§6).
    pub async fn persist_state(&self, db: &roombus_db::Database, room_id: Uuid) -> Result<(), MixerError> {
        let state = self.get_state(room_id).await;
        let blob = serde_json::to_value(&state)?;
        roombus_db::repository::rooms::persist_mix_state(&db.pool, room_id, &blob).await?;
        Ok(())
    }

    /// §4.3 `restoreState` — reads back and repopulates in-memory state.
    pub async fn restore_state(&self, db: &roombus_db::Database, room_id: Uuid) -> Result<(), MixerError> {
        let room = roombus_db::repository::rooms::find_by_id(&db.pool, room_id)
            .await?
            .ok_or(MixerError::RoomNotInitialized(room_id))?;
        let state: RoomMixState = serde_json::from_value(room.mix_state).unwrap_or_default();
        let entry = self.entry(room_id).await;
        entry.lock().await.state = state;
        Ok(())
    }

    /// §4.3 `getFailoverStatus` — `needsFailover = true` when the primary
    /// is not alive and channels are non-empty.
    pub async fn get_failover_status(&self, room_id: Uuid) -> FailoverStatus {
        let entry = self.entry(room_id).await;
        let guard = entry.lock().await;
        let alive = guard.is_primary_alive(self.heartbeat_window);
        let has_channels = !guard.state.channels.is_empty();
        FailoverStatus { needs_failover: !alive && has_channels, has_channels }
    }

    pub async fn current_primary(&self, room_id: Uuid) -> Option<Uuid> {
        let entry = self.entry(room_id).await;
        entry.lock().await.primary_client_id
    }

    pub async fn stats(&self) -> MixerStats {
        let rooms = self.rooms.read().await;
        let mut with_primary = 0;
        for room in rooms.values() {
            if room.lock().await.primary_client_id.is_some() {
                with_primary += 1;
            }
        }
        MixerStats { active_rooms: rooms.len(), rooms_with_primary: with_primary }
    }
}

fn merge_channel(channel: &mut ChannelMix, changes: &serde_json::Value) {
    let Some(obj) = changes.as_object() else { return };
    if let Some(v) = obj.get("gain").and_then(|v| v.as_f64()) {
        channel.gain = v as f32;
    }
    if let Some(v) = obj.get("pan").and_then(|v| v.as_f64()) {
        channel.pan = v as f32;
    }
    if let Some(v) = obj.get("fader").and_then(|v| v.as_f64()) {
        channel.fader = v as f32;
    }
    if let Some(v) = obj.get("mute").and_then(|v| v.as_bool()) {
        channel.mute = v;
    }
    if let Some(v) = obj.get("solo").and_then(|v| v.as_bool()) {
        channel.solo = v;
    }
    if let Some(v) = obj.get("pfl").and_then(|v| v.as_bool()) {
        channel.pfl = v;
    }
    if let Some(v) = obj.get("eq") {
        if let Ok(eq) = serde_json::from_value(v.clone()) {
            channel.eq = eq;
        }
    }
    if let Some(v) = obj.get("gate") {
        if let Ok(gate) = serde_json::from_value(v.clone()) {
            channel.gate = gate;
        }
    }
    if let Some(v) = obj.get("compressor") {
        if let Ok(c) = serde_json::from_value(v.clone()) {
            channel.compressor = c;
        }
    }
    if let Some(routing) = obj.get("routing").and_then(|v| v.as_object()) {
        for (bus, v) in routing {
            if let Some(b) = v.as_bool() {
                channel.routing.insert(bus.clone(), b);
            }
        }
    }
}

fn merge_master(master: &mut roombus_common::models::mix_state::MasterMix, changes: &serde_json::Value) {
    let Some(obj) = changes.as_object() else { return };
    if let Some(v) = obj.get("gain").and_then(|v| v.as_f64()) {
        master.gain = v as f32;
    }
    if let Some(v) = obj.get("mute").and_then(|v| v.as_bool()) {
        master.mute = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_primary_rejected_within_heartbeat_window() {
        let mixer = MixCoordinator::new(5);
        let room = Uuid::now_v7();
        let c1 = Uuid::now_v7();
        let c2 = Uuid::now_v7();
        mixer.register_primary_client(room, c1).await.unwrap();
        assert!(mixer.register_primary_client(room, c2).await.is_err());
    }

    #[tokio::test]
    async fn non_primary_state_change_rejected() {
        let mixer = MixCoordinator::new(5);
        let room = Uuid::now_v7();
        let c1 = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        mixer.register_primary_client(room, c1).await.unwrap();

        let change = MixStateChange {
            change_type: MixChangeType::Master,
            channel_id: None,
            changes: serde_json::json!({ "gain": 0.5 }),
            timestamp: Utc::now(),
            client_id: intruder,
        };
        assert!(mixer.apply_state_change(room, intruder, &change).await.is_err());
    }

    #[tokio::test]
    async fn add_channel_is_idempotent() {
        let mixer = MixCoordinator::new(5);
        let room = Uuid::now_v7();
        mixer.add_channel(room, "ch1".into()).await;
        let state = mixer.add_channel(room, "ch1".into()).await;
        assert_eq!(state.channels.len(), 1);
    }

    #[tokio::test]
    async fn channel_change_uses_defaults_when_absent() {
        let mixer = MixCoordinator::new(5);
        let room = Uuid::now_v7();
        let client = Uuid::now_v7();
        mixer.register_primary_client(room, client).await.unwrap();

        let change = MixStateChange {
            change_type: MixChangeType::Channel,
            channel_id: Some("ch1".into()),
            changes: serde_json::json!({ "mute": true }),
            timestamp: Utc::now(),
            client_id: client,
        };
        let state = mixer.apply_state_change(room, client, &change).await.unwrap();
        let ch = state.channels.get("ch1").unwrap();
        assert!(ch.mute);
        assert_eq!(ch.fader, 1.0);
    }
}
