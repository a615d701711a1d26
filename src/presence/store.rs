//! Participant metadata store
//!
//! Read-through cache of the last `USER_METADATA` message seen per sender.
//! Overwrite-by-latest, no versions, no conflict detection. Every change is
//! pushed to subscribers as a full immutable snapshot of the mapping.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::channel::WireMessage;
use crate::effect::{Effect, TimerKind};

use super::{fallback_display_name, ParticipantId, ParticipantMetadata};

/// Immutable snapshot of the metadata mapping
pub type MetadataMap = Arc<BTreeMap<ParticipantId, ParticipantMetadata>>;

/// Mapping from participant id to last-known metadata
#[derive(Debug)]
pub struct ParticipantMetadataStore {
    /// Metadata the local participant announces
    local: ParticipantMetadata,

    /// Last message seen per participant, local entry included
    entries: BTreeMap<ParticipantId, ParticipantMetadata>,

    /// Grace period before republishing to a newly joined member
    republish_delay: Duration,

    /// Snapshot fan-out to subscribers
    tx: watch::Sender<MetadataMap>,
}

impl ParticipantMetadataStore {
    /// Create a store seeded with the local participant's metadata
    pub fn new(local: ParticipantMetadata, republish_delay: Duration) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(local.id.clone(), local.clone());
        let (tx, _) = watch::channel(Arc::new(entries.clone()));

        Self {
            local,
            entries,
            republish_delay,
            tx,
        }
    }

    /// Get the local participant's metadata
    pub fn local(&self) -> &ParticipantMetadata {
        &self.local
    }

    /// Subscribe to mapping snapshots
    pub fn subscribe(&self) -> watch::Receiver<MetadataMap> {
        self.tx.subscribe()
    }

    /// Get metadata for a participant
    pub fn get(&self, id: &ParticipantId) -> Option<&ParticipantMetadata> {
        self.entries.get(id)
    }

    /// Resolve the display name for a participant
    pub fn display_name(&self, id: &ParticipantId) -> String {
        self.entries
            .get(id)
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| fallback_display_name(id))
    }

    /// Iterate over all known participants, local included
    pub fn iter(&self) -> impl Iterator<Item = &ParticipantMetadata> {
        self.entries.values()
    }

    /// Number of known participants, local included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a snapshot of the full mapping
    pub fn snapshot(&self) -> MetadataMap {
        Arc::new(self.entries.clone())
    }

    /// Apply a `USER_METADATA` message received from `publisher`
    ///
    /// A participant may only describe itself, so the entry is keyed by the
    /// channel-level publisher even when the payload claims another uid.
    pub fn apply_remote_metadata(
        &mut self,
        publisher: &ParticipantId,
        mut metadata: ParticipantMetadata,
    ) {
        if *publisher == self.local.id {
            tracing::trace!(participant = %publisher, "Ignoring metadata for local participant");
            return;
        }

        if metadata.id != *publisher {
            tracing::warn!(
                publisher = %publisher,
                claimed = %metadata.id,
                "Metadata uid does not match publisher, keying by publisher"
            );
            metadata.id = publisher.clone();
        }

        tracing::debug!(
            participant = %publisher,
            display_name = %metadata.display_name,
            screen_sharing = metadata.is_screen_sharing,
            "Metadata updated"
        );

        self.entries.insert(publisher.clone(), metadata);
        self.notify();
    }

    /// Handle a presence snapshot: republish so late joiners converge
    pub fn on_presence_snapshot(&mut self) -> Vec<Effect> {
        tracing::debug!("Presence snapshot, announcing local metadata");
        vec![self.announce()]
    }

    /// Handle a remote join: republish after the grace period
    ///
    /// This is a heuristic delay, not a handshake. A member that leaves
    /// before it expires is never observed.
    pub fn on_member_joined(&mut self, id: &ParticipantId) -> Vec<Effect> {
        tracing::debug!(
            participant = %id,
            delay_ms = self.republish_delay.as_millis() as u64,
            "Member joined, scheduling metadata republish"
        );
        vec![Effect::Schedule(TimerKind::Republish, self.republish_delay)]
    }

    /// Handle a remote leave: drop the entry
    ///
    /// Returns the removed metadata, if any was known.
    pub fn on_member_left(&mut self, id: &ParticipantId) -> Option<ParticipantMetadata> {
        if *id == self.local.id {
            return None;
        }

        let removed = self.entries.remove(id);
        match removed {
            Some(ref metadata) => {
                tracing::info!(
                    participant = %id,
                    display_name = %metadata.display_name,
                    "Participant left"
                );
                self.notify();
            }
            None => {
                tracing::debug!(participant = %id, "Member left without announcing metadata");
            }
        }
        removed
    }

    /// Update the local screen-sharing flag and republish
    pub fn set_local_screen_sharing(&mut self, is_screen_sharing: bool) -> Vec<Effect> {
        self.local.is_screen_sharing = is_screen_sharing;
        self.entries.insert(self.local.id.clone(), self.local.clone());
        self.notify();
        vec![self.announce()]
    }

    /// Build the effect that broadcasts local metadata
    pub fn announce(&self) -> Effect {
        Effect::Publish(WireMessage::UserMetadata(self.local.clone()))
    }

    fn notify(&self) {
        self.tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParticipantMetadataStore {
        ParticipantMetadataStore::new(
            ParticipantMetadata::new("local".into(), "Local"),
            Duration::from_millis(100),
        )
    }

    fn metadata(id: &str, name: &str) -> ParticipantMetadata {
        ParticipantMetadata::new(id.into(), name)
    }

    #[test]
    fn test_seeded_with_local() {
        let store = store();

        assert_eq!(store.len(), 1);
        assert_eq!(store.display_name(&"local".into()), "Local");
        assert_eq!(store.display_name(&"ghost".into()), "User ghost");
    }

    #[test]
    fn test_apply_same_message_twice_is_idempotent() {
        let mut store = store();
        let bob = metadata("bob", "Bob");

        store.apply_remote_metadata(&"bob".into(), bob.clone());
        let once = store.snapshot();
        store.apply_remote_metadata(&"bob".into(), bob);
        let twice = store.snapshot();

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_interleaved_senders_converge_to_latest() {
        let mut store = store();
        let messages = [
            ("bob", "Bob"),
            ("carol", "Carol"),
            ("bob", "Bobby"),
            ("dave", "Dave"),
            ("carol", "Caroline"),
            ("bob", "Robert"),
        ];

        for (sender, name) in messages {
            store.apply_remote_metadata(&sender.into(), metadata(sender, name));
        }

        let map = store.snapshot();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&ParticipantId::from("bob")].display_name, "Robert");
        assert_eq!(map[&ParticipantId::from("carol")].display_name, "Caroline");
        assert_eq!(map[&ParticipantId::from("dave")].display_name, "Dave");
    }

    #[test]
    fn test_keyed_by_publisher() {
        let mut store = store();

        store.apply_remote_metadata(&"bob".into(), metadata("mallory", "Bob"));

        assert!(store.get(&"mallory".into()).is_none());
        assert_eq!(store.get(&"bob".into()).unwrap().id, ParticipantId::from("bob"));
    }

    #[test]
    fn test_local_entry_not_overwritten_by_remote() {
        let mut store = store();

        store.apply_remote_metadata(&"local".into(), metadata("local", "Impostor"));

        assert_eq!(store.display_name(&"local".into()), "Local");
    }

    #[test]
    fn test_subscribers_receive_snapshots() {
        let mut store = store();
        let mut rx = store.subscribe();

        store.apply_remote_metadata(&"bob".into(), metadata("bob", "Bob"));

        assert!(rx.has_changed().unwrap());
        let map = rx.borrow_and_update().clone();
        assert!(map.contains_key(&ParticipantId::from("bob")));

        store.on_member_left(&"bob".into());
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow().contains_key(&ParticipantId::from("bob")));
    }

    #[test]
    fn test_snapshot_triggers_announce() {
        let mut store = store();

        let effects = store.on_presence_snapshot();

        assert_eq!(
            effects,
            vec![Effect::Publish(WireMessage::UserMetadata(metadata("local", "Local")))]
        );
    }

    #[test]
    fn test_join_schedules_republish() {
        let mut store = store();

        let effects = store.on_member_joined(&"bob".into());

        assert_eq!(
            effects,
            vec![Effect::Schedule(TimerKind::Republish, Duration::from_millis(100))]
        );
    }

    #[test]
    fn test_member_left_unknown() {
        let mut store = store();

        assert!(store.on_member_left(&"ghost".into()).is_none());
        assert!(store.on_member_left(&"local".into()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_local_screen_sharing_republishes() {
        let mut store = store();

        let effects = store.set_local_screen_sharing(true);

        assert!(store.local().is_screen_sharing);
        assert!(store.get(&"local".into()).unwrap().is_screen_sharing);
        match effects[0].as_publish() {
            Some(WireMessage::UserMetadata(m)) => assert!(m.is_screen_sharing),
            other => panic!("unexpected effect: {:?}", other),
        }
    }
}
