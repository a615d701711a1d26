//! Media publish state tracker
//!
//! The media layer reports raw publish/unpublish events and never says
//! whether a video track is a camera or a screen. The tracker infers it:
//!
//! ```text
//!   video published ──► camera
//!         │
//!   video unpublished   (had video, now none)
//!         │
//!   video published ──► screen share start   (sharer := participant)
//!         │
//!   video unpublished ──► screen share end   (sharer := none)
//! ```
//!
//! A camera toggled off and on again produces the same sequence and is
//! classified as a screen share. There is no in-protocol signal to tell the
//! two apart. Only one participant can be the global sharer; a later share
//! overwrites an earlier one.

use std::collections::{BTreeMap, HashSet};

use crate::presence::ParticipantId;

/// Opaque handle to a media-layer video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackHandle(pub u64);

/// Current media state of one remote participant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaState {
    pub has_video: bool,
    pub has_audio: bool,
    pub is_screen_sharing: bool,
    pub video_track: Option<TrackHandle>,
}

/// The global active screen share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenSharingState {
    pub is_active: bool,
    pub sharer: Option<ParticipantId>,
}

impl ScreenSharingState {
    fn active(sharer: ParticipantId) -> Self {
        Self {
            is_active: true,
            sharer: Some(sharer),
        }
    }

    /// Check if `id` is the active sharer
    pub fn is_sharer(&self, id: &ParticipantId) -> bool {
        self.is_active && self.sharer.as_ref() == Some(id)
    }
}

/// Local participant's own media controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalMediaState {
    pub microphone_muted: bool,
    pub camera_off: bool,
    pub screen_sharing: bool,
}

/// Raw event from the media transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    MemberJoined(ParticipantId),
    MemberLeft(ParticipantId),
    VideoPublished {
        participant: ParticipantId,
        track: TrackHandle,
    },
    VideoUnpublished(ParticipantId),
    AudioPublished(ParticipantId),
    AudioUnpublished(ParticipantId),
}

impl MediaEvent {
    /// Participant the event refers to
    pub fn participant(&self) -> &ParticipantId {
        match self {
            MediaEvent::MemberJoined(id)
            | MediaEvent::MemberLeft(id)
            | MediaEvent::VideoUnpublished(id)
            | MediaEvent::AudioPublished(id)
            | MediaEvent::AudioUnpublished(id) => id,
            MediaEvent::VideoPublished { participant, .. } => participant,
        }
    }
}

/// How a video publish was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPublishKind {
    Camera,
    ScreenShareStarted,
}

/// How a video unpublish was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoUnpublishKind {
    /// Ordinary camera unpublish
    CameraStopped,
    /// The participant's screen share ended
    ScreenShareEnded,
    /// Participant was never seen by the tracker
    Unknown,
}

/// Per-participant media state and screen-share classifier
#[derive(Debug, Default)]
pub struct MediaPublishStateTracker {
    /// Remote participants seen by the media layer
    remote: BTreeMap<ParticipantId, MediaState>,

    /// Participants that have published video before
    had_video: HashSet<ParticipantId>,

    /// Global active screen share
    screen_sharing: ScreenSharingState,

    /// Local controls
    local: LocalMediaState,
}

impl MediaPublishStateTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the media state of a remote participant
    pub fn get(&self, id: &ParticipantId) -> Option<&MediaState> {
        self.remote.get(id)
    }

    /// Iterate over remote participants
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &MediaState)> {
        self.remote.iter()
    }

    /// Check if a remote participant is classified as screen sharing
    pub fn is_screen_sharing(&self, id: &ParticipantId) -> bool {
        self.remote.get(id).is_some_and(|s| s.is_screen_sharing)
    }

    /// Get the global screen-share state
    pub fn screen_sharing(&self) -> &ScreenSharingState {
        &self.screen_sharing
    }

    /// Get the local media controls
    pub fn local(&self) -> LocalMediaState {
        self.local
    }

    /// Apply a raw media event
    pub fn apply(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MemberJoined(id) => self.member_joined(&id),
            MediaEvent::MemberLeft(id) => self.member_left(&id),
            MediaEvent::VideoPublished { participant, track } => {
                self.video_published(&participant, track);
            }
            MediaEvent::VideoUnpublished(id) => {
                self.video_unpublished(&id);
            }
            MediaEvent::AudioPublished(id) => self.audio_published(&id),
            MediaEvent::AudioUnpublished(id) => self.audio_unpublished(&id),
        }
    }

    /// Register a remote participant with no media
    pub fn member_joined(&mut self, id: &ParticipantId) {
        if !self.remote.contains_key(id) {
            tracing::debug!(participant = %id, "Media member joined");
            self.remote.insert(id.clone(), MediaState::default());
        }
    }

    /// Forget a remote participant, ending its screen share if active
    pub fn member_left(&mut self, id: &ParticipantId) {
        let removed = self.remote.remove(id);
        self.had_video.remove(id);

        if self.screen_sharing.is_sharer(id) {
            tracing::info!(participant = %id, "Screen sharer left, clearing screen share");
            self.screen_sharing = ScreenSharingState::default();
        }

        if removed.is_some() {
            tracing::debug!(participant = %id, "Media member left");
        }
    }

    /// Classify and record a video publish
    pub fn video_published(&mut self, id: &ParticipantId, track: TrackHandle) -> VideoPublishKind {
        let had_video_before = self.had_video.contains(id);
        let state = self.remote.entry(id.clone()).or_default();
        let was_screen_sharing = state.is_screen_sharing;
        let unpublished_since = had_video_before && !state.has_video;

        state.has_video = true;
        state.video_track = Some(track);
        self.had_video.insert(id.clone());

        if unpublished_since && !was_screen_sharing {
            state.is_screen_sharing = true;
            self.screen_sharing = ScreenSharingState::active(id.clone());
            tracing::info!(participant = %id, "Screen share started");
            return VideoPublishKind::ScreenShareStarted;
        }

        state.is_screen_sharing = false;
        tracing::debug!(participant = %id, "Camera video published");
        VideoPublishKind::Camera
    }

    /// Classify and record a video unpublish
    pub fn video_unpublished(&mut self, id: &ParticipantId) -> VideoUnpublishKind {
        let Some(state) = self.remote.get_mut(id) else {
            tracing::debug!(participant = %id, "Video unpublished by unknown participant");
            return VideoUnpublishKind::Unknown;
        };

        state.has_video = false;
        state.video_track = None;

        if !state.is_screen_sharing {
            tracing::debug!(participant = %id, "Camera video unpublished");
            return VideoUnpublishKind::CameraStopped;
        }

        state.is_screen_sharing = false;
        self.had_video.remove(id);
        if let Some(ref sharer) = self.screen_sharing.sharer {
            if sharer != id {
                tracing::debug!(
                    participant = %id,
                    sharer = %sharer,
                    "Earlier sharer ended, clearing the global screen share"
                );
            }
        }
        self.screen_sharing = ScreenSharingState::default();
        tracing::info!(participant = %id, "Screen share ended");
        VideoUnpublishKind::ScreenShareEnded
    }

    /// Record an audio publish
    pub fn audio_published(&mut self, id: &ParticipantId) {
        self.remote.entry(id.clone()).or_default().has_audio = true;
    }

    /// Record an audio unpublish
    pub fn audio_unpublished(&mut self, id: &ParticipantId) {
        if let Some(state) = self.remote.get_mut(id) {
            state.has_audio = false;
        }
    }

    /// Start or stop the local screen share
    pub fn set_local_screen_sharing(&mut self, local_id: &ParticipantId, active: bool) {
        self.local.screen_sharing = active;
        if active {
            self.screen_sharing = ScreenSharingState::active(local_id.clone());
        } else if self.screen_sharing.is_sharer(local_id) {
            self.screen_sharing = ScreenSharingState::default();
        }
    }

    /// Mute or unmute the local microphone
    pub fn set_microphone_muted(&mut self, muted: bool) {
        self.local.microphone_muted = muted;
    }

    /// Turn the local camera off or on
    pub fn set_camera_off(&mut self, off: bool) {
        self.local.camera_off = off;
    }
}
