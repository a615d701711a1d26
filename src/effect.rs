//! Side effects requested by the state components
//!
//! Components never touch the transport or the clock. Each operation
//! returns the effects it needs and the session coordinator executes them
//! in order.

use std::time::Duration;

use crate::channel::WireMessage;

/// Single-shot timers owned by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Republish local metadata (join grace period, initial announcement)
    Republish,
    /// Broadcast buffered document edits
    NoteDebounce,
    /// Auto-release the edit lock after holder inactivity
    LockExpiry,
}

/// An effect to be carried out by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Broadcast a message on the signaling channel
    Publish(WireMessage),
    /// Start a timer, replacing any pending deadline of the same kind
    Schedule(TimerKind, Duration),
    /// Cancel a pending timer
    Cancel(TimerKind),
}

impl Effect {
    /// Get the message if this is a publish effect
    pub fn as_publish(&self) -> Option<&WireMessage> {
        match self {
            Effect::Publish(message) => Some(message),
            _ => None,
        }
    }
}
