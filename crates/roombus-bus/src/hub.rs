//! Channel registry (§4.2): every connected session's mailbox, indexed by
//! the bus channels it has joined.
//!
//! A session can be registered under more than one channel at once — a
//! waiting participant listens on `room:<id>` and `room:<id>:waiting`; a
//! green-room participant also listens on `<parentId>:ifb`. Keying each
//! channel's membership by participant id (rather than a flat `Vec`) lets
//! `RoomEvent::for_participant_ids` targeting filter without needing any
//! per-message metadata beyond what's already in the envelope.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use roombus_common::event::RoomEvent;

#[derive(Default)]
pub struct Hub {
    channels: RwLock<HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<RoomEvent>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, channel: &str, participant_id: Uuid, mailbox: mpsc::UnboundedSender<RoomEvent>) {
        let mut channels = self.channels.write().await;
        channels.entry(channel.to_string()).or_default().insert(participant_id, mailbox);
    }

    pub async fn leave(&self, channel: &str, participant_id: Uuid) {
        let mut channels = self.channels.write().await;
        if let Some(members) = channels.get_mut(channel) {
            members.remove(&participant_id);
            if members.is_empty() {
                channels.remove(channel);
            }
        }
    }

    /// Removes a participant from every channel it may have joined (§4.2
    /// disconnect).
    pub async fn leave_all(&self, participant_id: Uuid, joined: &[String]) {
        for channel in joined {
            self.leave(channel, participant_id).await;
        }
    }

    /// Publishes to every member of `event.channel`. When
    /// `for_participant_ids` is set, only those members receive it even
    /// though every other member is also subscribed to the channel.
    pub async fn publish(&self, event: RoomEvent) {
        let channels = self.channels.read().await;
        let Some(members) = channels.get(&event.channel) else { return };

        match &event.for_participant_ids {
            Some(targets) => {
                for id in targets {
                    if let Some(mailbox) = members.get(id) {
                        let _ = mailbox.send(event.clone());
                    }
                }
            }
            None => {
                for mailbox in members.values() {
                    let _ = mailbox.send(event.clone());
                }
            }
        }
    }

    pub async fn member_count(&self, channel: &str) -> usize {
        self.channels.read().await.get(channel).map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn targeted_event_skips_non_targeted_members() {
        let hub = Hub::new();
        let room = "room:test".to_string();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        hub.join(&room, a, a_tx).await;
        hub.join(&room, b, b_tx).await;

        hub.publish(RoomEvent::new("chat:private", room, serde_json::json!({})).targeted(vec![a])).await;

        assert!(a_rx.try_recv().is_ok());
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_all_removes_every_membership() {
        let hub = Hub::new();
        let participant = Uuid::now_v7();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.join("room:a", participant, tx.clone()).await;
        hub.join("room:a:waiting", participant, tx).await;

        hub.leave_all(participant, &["room:a".to_string(), "room:a:waiting".to_string()]).await;

        assert_eq!(hub.member_count("room:a").await, 0);
        assert_eq!(hub.member_count("room:a:waiting").await, 0);
    }
}
