//! Advisory edit lock for the shared document
//!
//! Two broadcast messages, no acknowledgement, no arbiter. Whoever sent the
//! last `NOTE_LOCK_ACQUIRED` a client has seen is the holder from that
//! client's point of view. Two participants acquiring within one delivery
//! window can both believe they hold the lock; this is a UX hint, not a
//! mutual-exclusion guarantee.
//!
//! Local view of the lock:
//!
//! ```text
//!              request_lock                 idle timeout / release_lock
//!   Unlocked ───────────────► Editing ───────────────────────────────► Unlocked
//!      │
//!      │ remote LOCK_ACQUIRED             remote LOCK_RELEASED
//!      └───────────────────► Viewing ─────────────────────────────────► Unlocked
//! ```

pub mod coordinator;
pub mod document;

use serde::Serialize;

use crate::presence::ParticipantId;

pub use coordinator::EditLockCoordinator;
pub use document::DocumentSnapshot;

/// Who holds the edit lock, as last observed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockState {
    pub holder_id: Option<ParticipantId>,
    pub holder_name: Option<String>,
}

impl LockState {
    /// Lock held by `id`
    pub fn held_by(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            holder_id: Some(id),
            holder_name: Some(name.into()),
        }
    }

    /// Check if anyone holds the lock
    pub fn is_held(&self) -> bool {
        self.holder_id.is_some()
    }

    /// Check if `id` holds the lock
    pub fn is_held_by(&self, id: &ParticipantId) -> bool {
        self.holder_id.as_ref() == Some(id)
    }
}

/// Local client's relation to the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LockPhase {
    /// Nobody holds the lock
    Unlocked,
    /// Local participant holds the lock
    Editing,
    /// Another participant holds the lock
    Viewing,
}
