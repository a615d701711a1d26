//! In-process signaling channel
//!
//! `MemoryHub` plays the role of the broadcast service for participants that
//! share a process (tests, demos, embedded single-host sessions). Each
//! `MemoryChannel` endpoint is one participant's connection to the hub.
//!
//! Payloads are `Bytes`, so fan-out to N members shares one allocation.
//! Delivery is best effort: an event for a member whose queue is full or
//! closed is dropped, matching the unreliable transport the core tolerates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::error::ChannelError;
use crate::presence::ParticipantId;

use super::{ChannelEvent, PresenceEvent, SignalingChannel};

/// Default per-member event queue capacity
pub const DEFAULT_MEMBER_CAPACITY: usize = 256;

/// Shared in-process broadcast channel
pub struct MemoryHub {
    /// Subscribed members and their event queues
    members: RwLock<HashMap<ParticipantId, mpsc::Sender<ChannelEvent>>>,

    /// When false, subscribe and publish fail as if the service were down
    reachable: AtomicBool,

    /// Per-member queue capacity
    member_capacity: usize,
}

impl MemoryHub {
    /// Create a new hub with default queue capacity
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_MEMBER_CAPACITY)
    }

    /// Create a new hub with a custom per-member queue capacity
    pub fn with_capacity(member_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            members: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            member_capacity,
        })
    }

    /// Create an unsubscribed endpoint on this hub
    pub fn endpoint(self: &Arc<Self>) -> MemoryChannel {
        MemoryChannel {
            hub: Arc::clone(self),
            local: Mutex::new(None),
        }
    }

    /// Simulate the service going down or coming back
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
        tracing::debug!(reachable = reachable, "Memory hub reachability changed");
    }

    /// Check whether the hub accepts traffic
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    /// Number of subscribed members
    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    /// Drop a member as if its connection died
    ///
    /// Remaining members see `Left`. Nothing is sent on the dropped
    /// member's behalf.
    pub async fn disconnect(&self, id: &ParticipantId) {
        if self.remove_member(id).await {
            tracing::info!(participant = %id, "Member connection dropped");
        }
    }

    async fn add_member(&self, id: &ParticipantId) -> mpsc::Receiver<ChannelEvent> {
        let (tx, rx) = mpsc::channel(self.member_capacity);
        let _ = tx.try_send(ChannelEvent::Presence(PresenceEvent::Snapshot));

        let mut members = self.members.write().await;
        if members.insert(id.clone(), tx).is_some() {
            tracing::warn!(participant = %id, "Member resubscribed, replacing previous queue");
        }
        Self::deliver(
            &members,
            id,
            ChannelEvent::Presence(PresenceEvent::Joined(id.clone())),
        );

        tracing::debug!(participant = %id, members = members.len(), "Member subscribed");
        rx
    }

    async fn remove_member(&self, id: &ParticipantId) -> bool {
        let mut members = self.members.write().await;
        if members.remove(id).is_none() {
            return false;
        }
        Self::deliver(
            &members,
            id,
            ChannelEvent::Presence(PresenceEvent::Left(id.clone())),
        );
        true
    }

    async fn broadcast(&self, from: &ParticipantId, payload: Bytes) -> usize {
        let members = self.members.read().await;
        Self::deliver(
            &members,
            from,
            ChannelEvent::Message {
                publisher: from.clone(),
                payload,
            },
        )
    }

    /// Deliver an event to every member except `from`
    ///
    /// Returns the number of members that accepted the event.
    fn deliver(
        members: &HashMap<ParticipantId, mpsc::Sender<ChannelEvent>>,
        from: &ParticipantId,
        event: ChannelEvent,
    ) -> usize {
        let mut delivered = 0;
        for (id, tx) in members.iter().filter(|(id, _)| *id != from) {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(participant = %id, "Member queue full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(participant = %id, "Member queue closed, dropping event");
                }
            }
        }
        delivered
    }
}

/// One participant's connection to a `MemoryHub`
pub struct MemoryChannel {
    hub: Arc<MemoryHub>,
    local: Mutex<Option<ParticipantId>>,
}

impl SignalingChannel for MemoryChannel {
    async fn subscribe(
        &self,
        local_id: &ParticipantId,
    ) -> Result<mpsc::Receiver<ChannelEvent>, ChannelError> {
        if !self.hub.is_reachable() {
            return Err(ChannelError::InitFailed("memory hub unreachable".into()));
        }

        let rx = self.hub.add_member(local_id).await;
        *self.local.lock().await = Some(local_id.clone());
        Ok(rx)
    }

    async fn publish(&self, payload: Bytes) -> Result<(), ChannelError> {
        let local = self.local.lock().await.clone();
        let Some(local) = local else {
            return Err(ChannelError::NotSubscribed);
        };
        if !self.hub.is_reachable() {
            return Err(ChannelError::PublishFailed("memory hub unreachable".into()));
        }

        let delivered = self.hub.broadcast(&local, payload).await;
        tracing::trace!(publisher = %local, delivered = delivered, "Payload broadcast");
        Ok(())
    }

    async fn unsubscribe(&self) {
        if let Some(local) = self.local.lock().await.take() {
            self.hub.remove_member(&local).await;
            tracing::debug!(participant = %local, "Member unsubscribed");
        }
    }
}
