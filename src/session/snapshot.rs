//! Outward-facing session snapshot
//!
//! A read-only view assembled from the three state stores after every
//! handled event. Serializes to camelCase JSON for UI consumers.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::lock::{EditLockCoordinator, LockPhase};
use crate::media::MediaPublishStateTracker;
use crate::presence::{ParticipantId, ParticipantMetadataStore};
use crate::stats::SignalingStats;

use super::state::SessionPhase;

/// One participant as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub display_name: String,
    pub has_video: bool,
    pub has_audio: bool,
    pub is_screen_sharing: bool,
}

/// Edit lock as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
    pub holder_id: Option<ParticipantId>,
    pub holder_name: Option<String>,
    pub phase: LockPhase,
}

impl Default for LockView {
    fn default() -> Self {
        Self {
            holder_id: None,
            holder_name: None,
            phase: LockPhase::Unlocked,
        }
    }
}

impl From<&EditLockCoordinator> for LockView {
    fn from(lock: &EditLockCoordinator) -> Self {
        let state = lock.state();
        Self {
            holder_id: state.holder_id.clone(),
            holder_name: state.holder_name.clone(),
            phase: lock.phase(),
        }
    }
}

/// Global screen share as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSharingView {
    pub is_active: bool,
    pub sharer_id: Option<ParticipantId>,
    pub sharer_name: Option<String>,
}

/// Full session state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub local_id: Option<ParticipantId>,
    pub signaling_available: bool,
    /// Local participant first, then remote participants by id
    pub participants: Vec<ParticipantView>,
    pub lock: LockView,
    pub document_content: String,
    pub screen_sharing: ScreenSharingView,
    pub stats: SignalingStats,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            local_id: None,
            signaling_available: false,
            participants: Vec::new(),
            lock: LockView::default(),
            document_content: String::new(),
            screen_sharing: ScreenSharingView::default(),
            stats: SignalingStats::default(),
        }
    }
}

impl SessionSnapshot {
    /// Find a participant by id
    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.id == *id)
    }
}

/// Merge metadata and media state into the participant list
///
/// A participant known to either store is listed; one without metadata
/// gets the fallback display name.
pub(crate) fn participant_views(
    presence: &ParticipantMetadataStore,
    media: &MediaPublishStateTracker,
) -> Vec<ParticipantView> {
    let local = presence.local();
    let controls = media.local();

    let mut views = vec![ParticipantView {
        id: local.id.clone(),
        display_name: local.display_name.clone(),
        has_video: !controls.camera_off || controls.screen_sharing,
        has_audio: !controls.microphone_muted,
        is_screen_sharing: controls.screen_sharing,
    }];

    let remote: BTreeSet<&ParticipantId> = presence
        .iter()
        .map(|m| &m.id)
        .chain(media.iter().map(|(id, _)| id))
        .filter(|id| **id != local.id)
        .collect();

    for id in remote {
        let metadata_sharing = presence.get(id).is_some_and(|m| m.is_screen_sharing);
        let state = media.get(id);
        views.push(ParticipantView {
            id: id.clone(),
            display_name: presence.display_name(id),
            has_video: state.is_some_and(|s| s.has_video),
            has_audio: state.is_some_and(|s| s.has_audio),
            is_screen_sharing: metadata_sharing || media.is_screen_sharing(id),
        });
    }

    views
}

/// Resolve the global screen share with the sharer's display name
pub(crate) fn screen_sharing_view(
    presence: &ParticipantMetadataStore,
    media: &MediaPublishStateTracker,
) -> ScreenSharingView {
    let sharing = media.screen_sharing();
    ScreenSharingView {
        is_active: sharing.is_active,
        sharer_id: sharing.sharer.clone(),
        sharer_name: sharing.sharer.as_ref().map(|id| presence.display_name(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackHandle;
    use crate::presence::ParticipantMetadata;
    use std::time::Duration;

    fn stores() -> (ParticipantMetadataStore, MediaPublishStateTracker) {
        let presence = ParticipantMetadataStore::new(
            ParticipantMetadata::new("me".into(), "Me"),
            Duration::from_millis(100),
        );
        (presence, MediaPublishStateTracker::new())
    }

    #[test]
    fn test_local_participant_first() {
        let (mut presence, mut media) = stores();
        presence.apply_remote_metadata(&"a".into(), ParticipantMetadata::new("a".into(), "Ann"));
        media.set_microphone_muted(true);

        let views = participant_views(&presence, &media);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id.as_str(), "me");
        assert!(views[0].has_video);
        assert!(!views[0].has_audio);
        assert_eq!(views[1].display_name, "Ann");
    }

    #[test]
    fn test_media_only_participant_gets_fallback_name() {
        let (presence, mut media) = stores();
        media.member_joined(&"42".into());
        media.audio_published(&"42".into());

        let views = participant_views(&presence, &media);

        assert_eq!(views[1].display_name, "User 42");
        assert!(views[1].has_audio);
        assert!(!views[1].has_video);
    }

    #[test]
    fn test_screen_share_from_media_or_metadata() {
        let (mut presence, mut media) = stores();
        let mut bob = ParticipantMetadata::new("bob".into(), "Bob");
        bob.is_screen_sharing = true;
        presence.apply_remote_metadata(&"bob".into(), bob);

        let carol: ParticipantId = "carol".into();
        media.video_published(&carol, TrackHandle(1));
        media.video_unpublished(&carol);
        media.video_published(&carol, TrackHandle(2));
        presence.apply_remote_metadata(&carol, ParticipantMetadata::new(carol.clone(), "Carol"));

        let views = participant_views(&presence, &media);
        assert!(views.iter().skip(1).all(|p| p.is_screen_sharing));

        let sharing = screen_sharing_view(&presence, &media);
        assert!(sharing.is_active);
        assert_eq!(sharing.sharer_name.as_deref(), Some("Carol"));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(SessionSnapshot::default()).unwrap();

        assert_eq!(json["phase"], "idle");
        assert_eq!(json["signalingAvailable"], false);
        assert_eq!(json["lock"]["phase"], "unlocked");
        assert!(json["lock"]["holderId"].is_null());
        assert_eq!(json["documentContent"], "");
    }
}
