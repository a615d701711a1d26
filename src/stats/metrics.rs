//! Signaling statistics

use serde::Serialize;

/// Counters for traffic on the signaling channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingStats {
    /// Application messages received from remote publishers
    pub messages_received: u64,
    /// Messages successfully published
    pub messages_published: u64,
    /// Inbound messages dropped as malformed or of unknown type
    pub malformed_dropped: u64,
    /// Outbound messages the channel rejected
    pub publish_failures: u64,
    /// Outbound messages discarded because signaling is unavailable
    pub local_only_drops: u64,
    /// Edit locks released by the inactivity timer
    pub lock_expiries: u64,
}

impl SignalingStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbound messages attempted, successful or not
    pub fn publish_attempts(&self) -> u64 {
        self.messages_published + self.publish_failures + self.local_only_drops
    }

    /// Fraction of inbound messages dropped as malformed
    pub fn malformed_ratio(&self) -> f64 {
        let total = self.messages_received + self.malformed_dropped;
        if total > 0 {
            self.malformed_dropped as f64 / total as f64
        } else {
            0.0
        }
    }
}
