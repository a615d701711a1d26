//! Session inputs
//!
//! Everything the coordinator reacts to arrives as one closed set of
//! events: channel traffic, media-layer notifications and local commands.

use tokio::sync::oneshot;

use crate::channel::ChannelEvent;
use crate::error::Result;
use crate::media::MediaEvent;
use crate::presence::ParticipantId;

/// Local command issued by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join the session as `local_id`
    Join {
        local_id: ParticipantId,
        display_name: String,
    },
    /// Leave the session, releasing the edit lock if held
    Leave,
    /// Start or stop sharing the local screen
    SetLocalScreenSharing(bool),
    /// Mute or unmute the local microphone
    SetMicrophoneMuted(bool),
    /// Turn the local camera off or on
    SetCameraOff(bool),
    /// Take the edit lock
    RequestLock,
    /// Give up the edit lock
    ReleaseLock,
    /// Replace the document content (lock holder only)
    EditDocument(String),
}

impl Command {
    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join { .. } => "join",
            Command::Leave => "leave",
            Command::SetLocalScreenSharing(_) => "setLocalScreenSharing",
            Command::SetMicrophoneMuted(_) => "setMicrophoneMuted",
            Command::SetCameraOff(_) => "setCameraOff",
            Command::RequestLock => "requestLock",
            Command::ReleaseLock => "releaseLock",
            Command::EditDocument(_) => "editDocument",
        }
    }
}

/// Event routed through the coordinator
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Message or presence change from the signaling channel
    Channel(ChannelEvent),
    /// Notification from the media transport
    Media(MediaEvent),
    /// Local command
    Command(Command),
}

impl From<ChannelEvent> for SessionEvent {
    fn from(event: ChannelEvent) -> Self {
        SessionEvent::Channel(event)
    }
}

impl From<MediaEvent> for SessionEvent {
    fn from(event: MediaEvent) -> Self {
        SessionEvent::Media(event)
    }
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        SessionEvent::Command(command)
    }
}

/// Event queued for the coordinator task, with an optional reply slot
#[derive(Debug)]
pub struct Request {
    pub event: SessionEvent,
    pub reply: Option<oneshot::Sender<Result<()>>>,
}

impl Request {
    /// Fire-and-forget request
    pub fn notify(event: impl Into<SessionEvent>) -> Self {
        Self {
            event: event.into(),
            reply: None,
        }
    }

    /// Request whose outcome is reported on the returned receiver
    pub fn with_reply(event: impl Into<SessionEvent>) -> (Self, oneshot::Receiver<Result<()>>) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            event: event.into(),
            reply: Some(tx),
        };
        (request, rx)
    }
}
