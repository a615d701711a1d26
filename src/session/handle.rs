//! Cloneable front end to a running session coordinator

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel::SignalingChannel;
use crate::error::{Result, SessionError};
use crate::media::MediaEvent;
use crate::presence::ParticipantId;

use super::command::{Command, Request};
use super::config::SessionConfig;
use super::coordinator::SessionCoordinator;
use super::snapshot::SessionSnapshot;

/// Handle to a session coordinator task
///
/// Commands wait for the coordinator to apply them and report rejection.
/// Media events are queued without waiting. The task stops once every
/// handle is dropped, leaving the session first.
///
/// # Example
///
/// ```no_run
/// use huddle_sync::channel::MemoryHub;
/// use huddle_sync::session::{SessionConfig, SessionHandle};
///
/// # async fn example() -> huddle_sync::Result<()> {
/// let hub = MemoryHub::new();
/// let (session, _task) = SessionHandle::spawn(SessionConfig::default(), hub.endpoint());
///
/// session.join("alice", "Alice").await?;
/// session.request_lock().await?;
/// session.edit_document("Agenda").await?;
/// println!("{:?}", session.snapshot().lock);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inputs: mpsc::Sender<Request>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Spawn a coordinator on `channel` and return a handle to it
    pub fn spawn<C: SignalingChannel>(config: SessionConfig, channel: C) -> (Self, JoinHandle<()>) {
        let (inputs, rx) = mpsc::channel(config.input_buffer.max(1));
        let coordinator = SessionCoordinator::new(config, channel);
        let snapshot = coordinator.watch_snapshot();
        let task = tokio::spawn(coordinator.run(rx));

        (Self { inputs, snapshot }, task)
    }

    /// Join the session
    pub async fn join(
        &self,
        local_id: impl Into<ParticipantId>,
        display_name: impl Into<String>,
    ) -> Result<()> {
        self.command(Command::Join {
            local_id: local_id.into(),
            display_name: display_name.into(),
        })
        .await
    }

    /// Leave the session
    pub async fn leave(&self) -> Result<()> {
        self.command(Command::Leave).await
    }

    /// Start or stop sharing the local screen
    pub async fn set_local_screen_sharing(&self, active: bool) -> Result<()> {
        self.command(Command::SetLocalScreenSharing(active)).await
    }

    /// Mute or unmute the local microphone
    pub async fn set_microphone_muted(&self, muted: bool) -> Result<()> {
        self.command(Command::SetMicrophoneMuted(muted)).await
    }

    /// Turn the local camera off or on
    pub async fn set_camera_off(&self, off: bool) -> Result<()> {
        self.command(Command::SetCameraOff(off)).await
    }

    /// Take the edit lock
    pub async fn request_lock(&self) -> Result<()> {
        self.command(Command::RequestLock).await
    }

    /// Give up the edit lock
    pub async fn release_lock(&self) -> Result<()> {
        self.command(Command::ReleaseLock).await
    }

    /// Replace the document content
    pub async fn edit_document(&self, content: impl Into<String>) -> Result<()> {
        self.command(Command::EditDocument(content.into())).await
    }

    /// Forward an event from the media transport
    pub async fn media_event(&self, event: MediaEvent) -> Result<()> {
        self.inputs
            .send(Request::notify(event))
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(())
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Check if the coordinator task has stopped
    pub fn is_closed(&self) -> bool {
        self.inputs.is_closed()
    }

    async fn command(&self, command: Command) -> Result<()> {
        let (request, reply) = Request::with_reply(command);
        self.inputs
            .send(request)
            .await
            .map_err(|_| SessionError::Closed)?;
        reply.await.map_err(|_| SessionError::Closed)?
    }
}
