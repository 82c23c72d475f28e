//! Per-user broadcast channel backing a bounded, time-windowed replay
//! buffer, per spec §4.9: one connection per user multiplexed across
//! browser tabs, at-least-once delivery while connected, and a replay
//! buffer served on reconnect so clients can reconcile missed updates.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mpo_common::{EventPublisher, NotificationEvent};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Per-user channel state: a broadcast sender live connections
/// subscribe to, plus a capped replay buffer for events emitted while
/// no connection (or a different tab's connection) was live.
struct UserChannel {
    sender: broadcast::Sender<NotificationEvent>,
    replay: RwLock<VecDeque<NotificationEvent>>,
    next_id: AtomicU64,
}

impl UserChannel {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            replay: RwLock::new(VecDeque::with_capacity(capacity)),
            next_id: AtomicU64::new(1),
        }
    }
}

/// The Notification Bus: owns one [`UserChannel`] per subscribed owner,
/// created lazily on first publish or subscribe.
pub struct NotifyBus {
    channels: RwLock<HashMap<Uuid, Arc<UserChannel>>>,
    replay_capacity: usize,
    replay_window: Duration,
}

impl NotifyBus {
    pub fn new(replay_capacity: usize, replay_window: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            replay_capacity,
            replay_window,
        }
    }

    async fn channel_for(&self, owner: Uuid) -> Arc<UserChannel> {
        if let Some(existing) = self.channels.read().await.get(&owner) {
            return existing.clone();
        }
        let mut channels = self.channels.write().await;
        channels
            .entry(owner)
            .or_insert_with(|| Arc::new(UserChannel::new(self.replay_capacity)))
            .clone()
    }

    /// Subscribes to `owner`'s live stream, returning the receiver plus
    /// the replay buffer (events within `replay_window`, oldest first)
    /// so the caller can reconcile before switching to live events.
    #[instrument(level = "debug", skip(self))]
    pub async fn subscribe(
        &self,
        owner: Uuid,
    ) -> (broadcast::Receiver<NotificationEvent>, Vec<NotificationEvent>) {
        let channel = self.channel_for(owner).await;
        let receiver = channel.sender.subscribe();

        let window = chrono::Duration::from_std(self.replay_window).unwrap_or_else(|_| chrono::Duration::zero());
        let cutoff = Utc::now() - window;
        let replay = channel
            .replay
            .read()
            .await
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect();

        (receiver, replay)
    }
}

#[async_trait]
impl EventPublisher for NotifyBus {
    /// Assigns the next monotonic id for `owner`, appends to the replay
    /// buffer (evicting the oldest entry past capacity), and broadcasts
    /// to any live subscribers. A `SendError` here just means nobody is
    /// currently connected, which is expected and not logged as a
    /// failure -- the replay buffer is what makes that safe.
    async fn publish(&self, owner: Uuid, mut event: NotificationEvent) -> mpo_core::Result<()> {
        let channel = self.channel_for(owner).await;
        event.id = channel.next_id.fetch_add(1, Ordering::SeqCst);

        {
            let mut replay = channel.replay.write().await;
            if replay.len() >= self.replay_capacity {
                replay.pop_front();
            }
            replay.push_back(event.clone());
        }

        let _ = channel.sender.send(event);
        metrics::counter!("mpo_notifications_published_total").increment(1);
        debug!("published notification for owner {owner}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpo_common::NotificationKind;

    fn event(kind: NotificationKind) -> NotificationEvent {
        NotificationEvent::new(kind, serde_json::json!({}))
    }

    #[tokio::test]
    async fn published_events_get_monotonic_ids_per_owner() {
        let bus = NotifyBus::new(16, Duration::from_secs(60));
        let owner = Uuid::new_v4();
        let (mut rx, _) = bus.subscribe(owner).await;

        bus.publish(owner, event(NotificationKind::FileUpdated))
            .await
            .unwrap();
        bus.publish(owner, event(NotificationKind::FileUpdated))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn subscribers_of_different_owners_are_isolated() {
        let bus = NotifyBus::new(16, Duration::from_secs(60));
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        let (mut rx_b, _) = bus.subscribe(owner_b).await;

        bus.publish(owner_a, event(NotificationKind::FileUpdated))
            .await
            .unwrap();

        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn reconnect_replays_recent_events_before_live_stream() {
        let bus = NotifyBus::new(16, Duration::from_secs(60));
        let owner = Uuid::new_v4();

        bus.publish(owner, event(NotificationKind::FileUpdated))
            .await
            .unwrap();
        bus.publish(owner, event(NotificationKind::FileDeleted))
            .await
            .unwrap();

        let (_rx, replay) = bus.subscribe(owner).await;
        assert_eq!(replay.len(), 2);
        assert_eq!(replay[0].id, 1);
        assert_eq!(replay[1].id, 2);
    }

    #[tokio::test]
    async fn replay_buffer_is_capped_at_capacity() {
        let bus = NotifyBus::new(2, Duration::from_secs(60));
        let owner = Uuid::new_v4();

        for _ in 0..5 {
            bus.publish(owner, event(NotificationKind::FileUpdated))
                .await
                .unwrap();
        }

        let (_rx, replay) = bus.subscribe(owner).await;
        assert_eq!(replay.len(), 2);
        assert_eq!(replay[0].id, 4);
        assert_eq!(replay[1].id, 5);
    }
}
