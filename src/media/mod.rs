//! Media publish state
//!
//! This module provides:
//! - Per-participant audio/video publish flags
//! - Screen-share inference from publish/unpublish adjacency
//! - The single global "active screen sharer" slot
//! - Local microphone/camera/screen state

pub mod tracker;

pub use tracker::{
    LocalMediaState, MediaEvent, MediaPublishStateTracker, MediaState, ScreenSharingState,
    TrackHandle, VideoPublishKind, VideoUnpublishKind,
};
