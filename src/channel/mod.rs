//! Signaling channel contract
//!
//! The broadcast transport is an external capability. This module defines
//! what the session core needs from it, the JSON wire format carried over
//! it, and an in-process implementation.
//!
//! ```text
//!        SignalingChannel (unordered, eventually delivered)
//!     ┌──────────────────────────────────────────────────────┐
//!     │ publish(Bytes)        ChannelEvent::Message          │
//!     │ subscribe(id) ──────► ChannelEvent::Presence         │
//!     │ unsubscribe()           (Snapshot / Joined / Left)   │
//!     └──────────────────────────────────────────────────────┘
//!               ▲                          │
//!               │ Effect::Publish          ▼ mpsc::Receiver
//!          ┌────┴──────────────────────────────────┐
//!          │          SessionCoordinator           │
//!          └───────────────────────────────────────┘
//! ```
//!
//! No ordering is guaranteed across senders, and per-sender FIFO is only
//! best effort.

pub mod memory;
pub mod message;

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::ChannelError;
use crate::presence::ParticipantId;

pub use memory::{MemoryChannel, MemoryHub};
pub use message::{LockAcquired, LockReleased, NoteUpdate, WireMessage};

/// Membership notification from the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Local subscription (re)established, existing members are visible
    Snapshot,
    /// A remote member subscribed
    Joined(ParticipantId),
    /// A remote member unsubscribed or dropped
    Left(ParticipantId),
}

/// Event delivered by the channel to a subscriber
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Application message broadcast by `publisher`
    Message {
        publisher: ParticipantId,
        payload: Bytes,
    },
    /// Membership change
    Presence(PresenceEvent),
}

/// Broadcast transport used for all signaling
///
/// Implementations deliver every published payload to the other
/// subscribers, with no ordering guarantee across senders.
pub trait SignalingChannel: Send + Sync + 'static {
    /// Subscribe as `local_id` and receive channel events
    ///
    /// Failure here puts the session into local-only mode.
    fn subscribe(
        &self,
        local_id: &ParticipantId,
    ) -> impl Future<Output = Result<mpsc::Receiver<ChannelEvent>, ChannelError>> + Send;

    /// Broadcast a payload to the other subscribers
    fn publish(&self, payload: Bytes) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Leave the channel
    fn unsubscribe(&self) -> impl Future<Output = ()> + Send;
}
