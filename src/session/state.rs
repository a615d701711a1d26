//! Session lifecycle state
//!
//! Tracks the local session from join to leave, including whether the
//! signaling channel is usable.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// Not joined yet
    Idle,
    /// Joined; commands and events are processed
    Active,
    /// Left; stores are torn down
    Left,
}

/// Signaling channel availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalingStatus {
    /// No subscription attempted
    Offline,
    /// Subscribed, remote reconciliation active
    Connected,
    /// Subscribe failed or channel closed; local-only mode
    Unavailable,
}

/// Lifecycle state of the local session
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current phase
    pub phase: SessionPhase,

    /// Signaling availability
    pub signaling: SignalingStatus,

    /// Time of the last join
    pub joined_at: Option<Instant>,
}

impl SessionState {
    /// Create an idle session state
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            signaling: SignalingStatus::Offline,
            joined_at: None,
        }
    }

    /// Enter the active phase
    pub fn on_join(&mut self, signaling_connected: bool) {
        self.phase = SessionPhase::Active;
        self.joined_at = Some(Instant::now());
        self.signaling = if signaling_connected {
            SignalingStatus::Connected
        } else {
            SignalingStatus::Unavailable
        };
    }

    /// Signaling channel went away mid-session
    pub fn on_signaling_lost(&mut self) {
        if self.phase == SessionPhase::Active {
            self.signaling = SignalingStatus::Unavailable;
        }
    }

    /// Leave the session
    pub fn on_leave(&mut self) {
        self.phase = SessionPhase::Left;
        self.signaling = SignalingStatus::Offline;
    }

    /// Check if the session is active
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Check if outbound messages can be published
    pub fn can_publish(&self) -> bool {
        self.is_active() && self.signaling == SignalingStatus::Connected
    }

    /// Time since the last join
    pub fn duration(&self) -> Option<Duration> {
        self.joined_at.map(|t| t.elapsed())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
