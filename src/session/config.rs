//! Session configuration
//!
//! Every heuristic delay in the protocol is a named setting so tests can
//! shrink them or drive them from a virtual clock.

use std::time::Duration;

/// Grace period before republishing metadata to a member that just joined
pub const DEFAULT_REPUBLISH_DELAY: Duration = Duration::from_millis(100);

/// Delay of the extra self-announcement after subscribing
pub const DEFAULT_INITIAL_ANNOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Quiet period before local edits are broadcast
pub const DEFAULT_NOTE_DEBOUNCE: Duration = Duration::from_secs(2);

/// Holder inactivity before the edit lock is released automatically
pub const DEFAULT_LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the handle to coordinator queue
pub const DEFAULT_INPUT_BUFFER: usize = 64;

/// Session coordinator configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Republish delay after a remote join
    pub republish_delay: Duration,

    /// Self-announcement delay after a successful subscribe
    pub initial_announce_delay: Duration,

    /// Document update debounce window
    pub note_debounce: Duration,

    /// Edit lock inactivity timeout
    pub lock_idle_timeout: Duration,

    /// Input queue capacity (minimum 1)
    pub input_buffer: usize,

    /// Clear the lock when the channel reports its holder as gone
    pub release_lock_on_holder_leave: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            republish_delay: DEFAULT_REPUBLISH_DELAY,
            initial_announce_delay: DEFAULT_INITIAL_ANNOUNCE_DELAY,
            note_debounce: DEFAULT_NOTE_DEBOUNCE,
            lock_idle_timeout: DEFAULT_LOCK_IDLE_TIMEOUT,
            input_buffer: DEFAULT_INPUT_BUFFER,
            release_lock_on_holder_leave: true,
        }
    }
}

impl SessionConfig {
    /// Set the republish delay after a remote join
    pub fn republish_delay(mut self, delay: Duration) -> Self {
        self.republish_delay = delay;
        self
    }

    /// Set the initial self-announcement delay
    pub fn initial_announce_delay(mut self, delay: Duration) -> Self {
        self.initial_announce_delay = delay;
        self
    }

    /// Set the document update debounce window
    pub fn note_debounce(mut self, window: Duration) -> Self {
        self.note_debounce = window;
        self
    }

    /// Set the edit lock inactivity timeout
    pub fn lock_idle_timeout(mut self, timeout: Duration) -> Self {
        self.lock_idle_timeout = timeout;
        self
    }

    /// Set the input queue capacity
    pub fn input_buffer(mut self, capacity: usize) -> Self {
        self.input_buffer = capacity.max(1);
        self
    }

    /// Keep a departed holder's lock until an explicit release arrives
    pub fn keep_lock_on_holder_leave(mut self) -> Self {
        self.release_lock_on_holder_leave = false;
        self
    }
}
