//! Edit lock coordinator
//!
//! Owns the lock state and the shared document. Local edits are only
//! accepted while the local participant holds the lock; they are buffered
//! and broadcast after a quiet period. The holder's own client runs an
//! inactivity timer that releases the lock when it fires, so a holder who
//! stops typing loses the lock. A holder whose client dies without sending
//! a release keeps it in everyone else's view until the channel reports
//! the member as gone.

use std::time::Duration;

use crate::channel::message::timestamp_now;
use crate::channel::{LockAcquired, LockReleased, NoteUpdate, WireMessage};
use crate::effect::{Effect, TimerKind};
use crate::error::SessionError;
use crate::presence::ParticipantId;

use super::{DocumentSnapshot, LockPhase, LockState};

/// Advisory single-writer lock over one shared document
#[derive(Debug)]
pub struct EditLockCoordinator {
    local_id: ParticipantId,
    local_name: String,
    state: LockState,
    document: DocumentSnapshot,
    idle_timeout: Duration,
    debounce: Duration,
}

impl EditLockCoordinator {
    /// Create a coordinator for the local participant
    pub fn new(
        local_id: ParticipantId,
        local_name: impl Into<String>,
        idle_timeout: Duration,
        debounce: Duration,
    ) -> Self {
        Self {
            local_id,
            local_name: local_name.into(),
            state: LockState::default(),
            document: DocumentSnapshot::new(),
            idle_timeout,
            debounce,
        }
    }

    /// Current lock state
    pub fn state(&self) -> &LockState {
        &self.state
    }

    /// Current document
    pub fn document(&self) -> &DocumentSnapshot {
        &self.document
    }

    /// Local view of the lock
    pub fn phase(&self) -> LockPhase {
        match &self.state.holder_id {
            None => LockPhase::Unlocked,
            Some(id) if *id == self.local_id => LockPhase::Editing,
            Some(_) => LockPhase::Viewing,
        }
    }

    /// Check if the local participant holds the lock
    pub fn is_local_holder(&self) -> bool {
        self.state.is_held_by(&self.local_id)
    }

    /// Take the lock and announce it
    ///
    /// Last acquire wins: this does not wait for, or check, a current holder.
    pub fn request_lock(&mut self) -> Vec<Effect> {
        match self.phase() {
            LockPhase::Viewing => {
                tracing::warn!(
                    holder = ?self.state.holder_id,
                    "Requesting edit lock while another participant holds it"
                );
            }
            LockPhase::Editing => {
                tracing::debug!("Edit lock already held, re-announcing");
            }
            LockPhase::Unlocked => {
                tracing::info!(participant = %self.local_id, "Edit lock acquired");
            }
        }

        self.state = LockState::held_by(self.local_id.clone(), self.local_name.clone());

        vec![
            Effect::Publish(WireMessage::LockAcquired(LockAcquired {
                user_id: self.local_id.clone(),
                display_name: self.local_name.clone(),
                timestamp: timestamp_now(),
            })),
            Effect::Schedule(TimerKind::LockExpiry, self.idle_timeout),
        ]
    }

    /// Flush the document and give up the lock
    pub fn release_lock(&mut self) -> Result<Vec<Effect>, SessionError> {
        if !self.is_local_holder() {
            return Err(SessionError::NotLockHolder);
        }

        tracing::info!(participant = %self.local_id, "Edit lock released");
        Ok(self.release_effects())
    }

    /// Apply a local edit
    ///
    /// Restarts both the broadcast debounce and the inactivity timer.
    pub fn edit_document(&mut self, content: String) -> Result<Vec<Effect>, SessionError> {
        if !self.is_local_holder() {
            return Err(SessionError::NotLockHolder);
        }

        self.document.edit(content);
        Ok(vec![
            Effect::Schedule(TimerKind::NoteDebounce, self.debounce),
            Effect::Schedule(TimerKind::LockExpiry, self.idle_timeout),
        ])
    }

    /// Debounce window elapsed: broadcast buffered edits
    pub fn on_debounce_elapsed(&mut self) -> Vec<Effect> {
        if !self.is_local_holder() || !self.document.has_unsynced_changes() {
            return Vec::new();
        }

        let content = self.document.mark_synced();
        tracing::debug!(bytes = content.len(), "Broadcasting document update");
        vec![Effect::Publish(self.note_update(content))]
    }

    /// Inactivity window elapsed: auto-release
    pub fn on_idle_timeout(&mut self) -> Vec<Effect> {
        if !self.is_local_holder() {
            return Vec::new();
        }

        tracing::info!(
            participant = %self.local_id,
            idle_ms = self.idle_timeout.as_millis() as u64,
            "Auto-releasing edit lock due to inactivity"
        );
        self.release_effects()
    }

    /// Apply a remote `NOTE_LOCK_ACQUIRED`
    pub fn apply_remote_acquired(&mut self, acquired: &LockAcquired) -> Vec<Effect> {
        let was_editing = self.is_local_holder();
        let previous = self.state.holder_id.clone();

        self.state = LockState::held_by(acquired.user_id.clone(), acquired.display_name.clone());

        if acquired.user_id == self.local_id {
            // Our own acquire seen again; make sure the expiry timer runs
            return if was_editing {
                Vec::new()
            } else {
                vec![Effect::Schedule(TimerKind::LockExpiry, self.idle_timeout)]
            };
        }

        match previous {
            Some(ref holder) if *holder != acquired.user_id => {
                tracing::info!(
                    previous = %holder,
                    holder = %acquired.user_id,
                    "Edit lock taken over by later acquire"
                );
            }
            _ => {
                tracing::info!(
                    holder = %acquired.user_id,
                    display_name = %acquired.display_name,
                    "Edit lock acquired by remote participant"
                );
            }
        }

        if was_editing {
            tracing::warn!(
                holder = %acquired.user_id,
                "Lost edit lock to a concurrent acquire, discarding unsent edits"
            );
            self.document.discard_unsynced();
            return Self::cancel_timers();
        }
        Vec::new()
    }

    /// Apply a remote `NOTE_LOCK_RELEASED`
    ///
    /// Unconditional: the lock is cleared whoever sent the release.
    pub fn apply_remote_released(&mut self, released: &LockReleased) -> Vec<Effect> {
        if let Some(ref holder) = self.state.holder_id {
            if *holder != released.user_id {
                tracing::debug!(
                    holder = %holder,
                    releaser = %released.user_id,
                    "Release from non-holder clears the lock"
                );
            }
        }

        let was_editing = self.is_local_holder();
        self.state = LockState::default();
        tracing::info!(releaser = %released.user_id, "Edit lock released by remote participant");

        if was_editing {
            tracing::warn!("Edit lock cleared by a remote release while editing");
            self.document.discard_unsynced();
            return Self::cancel_timers();
        }
        Vec::new()
    }

    /// Apply a remote `NOTE_UPDATE`
    ///
    /// Ignored while editing locally. Returns whether the content changed.
    pub fn apply_remote_update(&mut self, update: &NoteUpdate) -> bool {
        if self.is_local_holder() {
            tracing::debug!(
                sender = %update.user_id,
                "Ignoring document update while holding the edit lock"
            );
            return false;
        }
        if update.content == self.document.content() {
            return false;
        }

        tracing::debug!(
            sender = %update.user_id,
            bytes = update.content.len(),
            "Document updated"
        );
        self.document.replace(update.content.clone());
        true
    }

    /// Handle a member leaving the channel
    ///
    /// Returns true if the departed member held the lock and it was cleared.
    pub fn on_member_left(&mut self, id: &ParticipantId) -> bool {
        if *id == self.local_id || !self.state.is_held_by(id) {
            return false;
        }

        tracing::info!(holder = %id, "Edit lock holder left, clearing lock");
        self.state = LockState::default();
        true
    }

    /// Best-effort release before leaving the session
    pub fn teardown(&mut self) -> Vec<Effect> {
        if !self.is_local_holder() {
            return Self::cancel_timers();
        }

        tracing::info!(participant = %self.local_id, "Releasing edit lock before leaving");
        self.release_effects()
    }

    fn release_effects(&mut self) -> Vec<Effect> {
        let content = self.document.mark_synced();
        self.state = LockState::default();

        let mut effects = Self::cancel_timers();
        effects.push(Effect::Publish(self.note_update(content)));
        effects.push(Effect::Publish(WireMessage::LockReleased(LockReleased {
            user_id: self.local_id.clone(),
            timestamp: timestamp_now(),
        })));
        effects
    }

    fn note_update(&self, content: String) -> WireMessage {
        WireMessage::NoteUpdate(NoteUpdate {
            content,
            user_id: self.local_id.clone(),
            timestamp: timestamp_now(),
        })
    }

    fn cancel_timers() -> Vec<Effect> {
        vec![
            Effect::Cancel(TimerKind::NoteDebounce),
            Effect::Cancel(TimerKind::LockExpiry),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(10);
    const DEBOUNCE: Duration = Duration::from_secs(2);

    fn lock() -> EditLockCoordinator {
        EditLockCoordinator::new("alice".into(), "Alice", IDLE, DEBOUNCE)
    }

    fn acquired(id: &str, name: &str) -> LockAcquired {
        LockAcquired {
            user_id: id.into(),
            display_name: name.into(),
            timestamp: 1,
        }
    }

    fn released(id: &str) -> LockReleased {
        LockReleased {
            user_id: id.into(),
            timestamp: 2,
        }
    }

    fn published(effects: &[Effect]) -> Vec<&WireMessage> {
        effects.iter().filter_map(Effect::as_publish).collect()
    }

    #[test]
    fn test_request_lock() {
        let mut lock = lock();
        assert_eq!(lock.phase(), LockPhase::Unlocked);

        let effects = lock.request_lock();

        assert_eq!(lock.phase(), LockPhase::Editing);
        assert_eq!(lock.state(), &LockState::held_by("alice".into(), "Alice"));
        match published(&effects).as_slice() {
            [WireMessage::LockAcquired(a)] => {
                assert_eq!(a.user_id.as_str(), "alice");
                assert_eq!(a.display_name, "Alice");
            }
            other => panic!("unexpected messages: {:?}", other),
        }
        assert!(effects.contains(&Effect::Schedule(TimerKind::LockExpiry, IDLE)));
    }

    #[test]
    fn test_remote_acquire_sets_viewing() {
        let mut lock = lock();

        let effects = lock.apply_remote_acquired(&acquired("bob", "Bob"));

        assert!(effects.is_empty());
        assert_eq!(lock.phase(), LockPhase::Viewing);
        assert_eq!(lock.state().holder_name.as_deref(), Some("Bob"));

        lock.apply_remote_released(&released("bob"));
        assert_eq!(lock.phase(), LockPhase::Unlocked);
    }

    #[test]
    fn test_last_acquire_wins_over_existing_holder() {
        // Expected advisory behaviour, not a defect
        let mut lock = lock();
        lock.apply_remote_acquired(&acquired("bob", "Bob"));

        lock.apply_remote_acquired(&acquired("carol", "Carol"));

        assert!(lock.state().is_held_by(&"carol".into()));
    }

    #[test]
    fn test_request_while_viewing_takes_lock() {
        let mut lock = lock();
        lock.apply_remote_acquired(&acquired("bob", "Bob"));

        lock.request_lock();

        assert_eq!(lock.phase(), LockPhase::Editing);
    }

    #[test]
    fn test_edit_requires_lock() {
        let mut lock = lock();

        assert_eq!(
            lock.edit_document("text".into()),
            Err(SessionError::NotLockHolder)
        );
        assert_eq!(lock.release_lock(), Err(SessionError::NotLockHolder));

        lock.apply_remote_acquired(&acquired("bob", "Bob"));
        assert_eq!(
            lock.edit_document("text".into()),
            Err(SessionError::NotLockHolder)
        );
    }

    #[test]
    fn test_edit_restarts_timers() {
        let mut lock = lock();
        lock.request_lock();

        let effects = lock.edit_document("hello".into()).unwrap();

        assert_eq!(
            effects,
            vec![
                Effect::Schedule(TimerKind::NoteDebounce, DEBOUNCE),
                Effect::Schedule(TimerKind::LockExpiry, IDLE),
            ]
        );
        assert_eq!(lock.document().content(), "hello");
    }

    #[test]
    fn test_debounce_broadcasts_latest_once() {
        let mut lock = lock();
        lock.request_lock();
        lock.edit_document("a".into()).unwrap();
        lock.edit_document("ab".into()).unwrap();
        lock.edit_document("abc".into()).unwrap();

        let effects = lock.on_debounce_elapsed();
        match published(&effects).as_slice() {
            [WireMessage::NoteUpdate(u)] => assert_eq!(u.content, "abc"),
            other => panic!("unexpected messages: {:?}", other),
        }

        assert!(lock.on_debounce_elapsed().is_empty());
    }

    #[test]
    fn test_idle_timeout_flushes_then_releases() {
        let mut lock = lock();
        lock.request_lock();
        lock.edit_document("final".into()).unwrap();

        let effects = lock.on_idle_timeout();

        assert_eq!(lock.phase(), LockPhase::Unlocked);
        match published(&effects).as_slice() {
            [WireMessage::NoteUpdate(u), WireMessage::LockReleased(r)] => {
                assert_eq!(u.content, "final");
                assert_eq!(r.user_id.as_str(), "alice");
            }
            other => panic!("unexpected messages: {:?}", other),
        }
        assert!(effects.contains(&Effect::Cancel(TimerKind::NoteDebounce)));

        // Timer firing after release is a no-op
        assert!(lock.on_idle_timeout().is_empty());
    }

    #[test]
    fn test_release_lock_flushes() {
        let mut lock = lock();
        lock.request_lock();
        lock.edit_document("x".into()).unwrap();

        let effects = lock.release_lock().unwrap();

        assert_eq!(published(&effects).len(), 2);
        assert!(!lock.document().has_unsynced_changes());
    }

    #[test]
    fn test_remote_update_applied_by_non_holder() {
        let mut lock = lock();
        lock.apply_remote_acquired(&acquired("bob", "Bob"));

        let update = NoteUpdate {
            content: "from bob".into(),
            user_id: "bob".into(),
            timestamp: 3,
        };
        assert!(lock.apply_remote_update(&update));
        assert_eq!(lock.document().content(), "from bob");
        assert!(!lock.apply_remote_update(&update));
    }

    #[test]
    fn test_remote_update_ignored_by_holder() {
        let mut lock = lock();
        lock.request_lock();
        lock.edit_document("mine".into()).unwrap();

        let update = NoteUpdate {
            content: "theirs".into(),
            user_id: "bob".into(),
            timestamp: 3,
        };
        assert!(!lock.apply_remote_update(&update));
        assert_eq!(lock.document().content(), "mine");
    }

    #[test]
    fn test_losing_lock_cancels_timers() {
        let mut lock = lock();
        lock.request_lock();

        let effects = lock.apply_remote_acquired(&acquired("bob", "Bob"));

        assert_eq!(lock.phase(), LockPhase::Viewing);
        assert!(effects.contains(&Effect::Cancel(TimerKind::LockExpiry)));
        assert!(published(&effects).is_empty());
    }

    #[test]
    fn test_displaced_holder_discards_unsent_edits() {
        let mut lock = lock();
        lock.apply_remote_update(&NoteUpdate {
            content: "agreed".into(),
            user_id: "bob".into(),
            timestamp: 1,
        });
        lock.request_lock();
        lock.edit_document("alice unsent draft".into()).unwrap();

        lock.apply_remote_acquired(&acquired("bob", "Bob"));

        assert_eq!(lock.document().content(), "agreed");
        assert!(!lock.document().has_unsynced_changes());

        // Re-acquiring and releasing without edits flushes the agreed content
        lock.request_lock();
        let effects = lock.release_lock().unwrap();
        match published(&effects).as_slice() {
            [WireMessage::NoteUpdate(u), WireMessage::LockReleased(_)] => {
                assert_eq!(u.content, "agreed");
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[test]
    fn test_remote_release_discards_unsent_edits() {
        let mut lock = lock();
        lock.request_lock();
        lock.edit_document("draft".into()).unwrap();

        lock.apply_remote_released(&released("bob"));

        assert_eq!(lock.document().content(), "");
    }

    #[test]
    fn test_release_from_anyone_clears() {
        let mut lock = lock();
        lock.request_lock();

        let effects = lock.apply_remote_released(&released("bob"));

        assert_eq!(lock.phase(), LockPhase::Unlocked);
        assert!(effects.contains(&Effect::Cancel(TimerKind::NoteDebounce)));
    }

    #[test]
    fn test_own_acquire_echo_schedules_expiry() {
        let mut lock = lock();

        let effects = lock.apply_remote_acquired(&acquired("alice", "Alice"));

        assert_eq!(lock.phase(), LockPhase::Editing);
        assert_eq!(effects, vec![Effect::Schedule(TimerKind::LockExpiry, IDLE)]);
    }

    #[test]
    fn test_holder_departure_clears() {
        let mut lock = lock();
        lock.apply_remote_acquired(&acquired("bob", "Bob"));

        assert!(!lock.on_member_left(&"carol".into()));
        assert!(lock.on_member_left(&"bob".into()));
        assert_eq!(lock.phase(), LockPhase::Unlocked);
    }

    #[test]
    fn test_teardown() {
        let mut lock = lock();
        assert!(published(&lock.teardown()).is_empty());

        lock.request_lock();
        let effects = lock.teardown();
        assert!(matches!(
            published(&effects).last(),
            Some(WireMessage::LockReleased(_))
        ));
    }
}
