//! Session coordinator
//!
//! Composition root for one participant's session. It owns the metadata
//! store, the media tracker and the edit lock, routes every event to them
//! in arrival order and carries out the effects they return.
//!
//! ```text
//!   Request (mpsc) ───────┐
//!   ChannelEvent (mpsc) ──┼──► dispatch ──► component ──► Vec<Effect>
//!   timer deadline ───────┘                                   │
//!                                                             ▼
//!        watch<SessionSnapshot> ◄── snapshot     publish / schedule / cancel
//! ```
//!
//! All state mutation happens on the coordinator task. Handlers never
//! overlap; the only suspension points are channel calls.

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::channel::{ChannelEvent, PresenceEvent, SignalingChannel, WireMessage};
use crate::effect::{Effect, TimerKind};
use crate::error::{Result, SessionError};
use crate::lock::EditLockCoordinator;
use crate::media::{MediaEvent, MediaPublishStateTracker};
use crate::presence::{ParticipantId, ParticipantMetadata, ParticipantMetadataStore};
use crate::stats::SignalingStats;

use super::command::{Command, Request, SessionEvent};
use super::config::SessionConfig;
use super::snapshot::{participant_views, screen_sharing_view, LockView, SessionSnapshot};
use super::state::{SessionPhase, SessionState, SignalingStatus};
use super::timer::Timers;

/// Per-join state, rebuilt on every join and dropped on leave
#[derive(Debug)]
struct ActiveSession {
    local_id: ParticipantId,
    presence: ParticipantMetadataStore,
    media: MediaPublishStateTracker,
    lock: EditLockCoordinator,
}

/// Event dispatcher and effect executor for one participant
pub struct SessionCoordinator<C: SignalingChannel> {
    config: SessionConfig,
    channel: C,
    state: SessionState,
    inbound: Option<mpsc::Receiver<ChannelEvent>>,
    session: Option<ActiveSession>,
    timers: Timers,
    stats: SignalingStats,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<C: SignalingChannel> SessionCoordinator<C> {
    /// Create an idle coordinator on `channel`
    pub fn new(config: SessionConfig, channel: C) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());

        Self {
            config,
            channel,
            state: SessionState::new(),
            inbound: None,
            session: None,
            timers: Timers::new(),
            stats: SignalingStats::new(),
            snapshot_tx,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Signaling counters
    pub fn stats(&self) -> SignalingStats {
        self.stats
    }

    /// Subscribe to snapshots published after each handled event
    pub fn watch_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Assemble the current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            phase: self.state.phase,
            signaling_available: self.state.signaling == SignalingStatus::Connected,
            stats: self.stats,
            ..Default::default()
        };

        if let Some(session) = &self.session {
            snapshot.local_id = Some(session.local_id.clone());
            snapshot.participants = participant_views(&session.presence, &session.media);
            snapshot.lock = LockView::from(&session.lock);
            snapshot.document_content = session.lock.document().content().to_owned();
            snapshot.screen_sharing = screen_sharing_view(&session.presence, &session.media);
        }

        snapshot
    }

    /// Handle one event and publish the resulting snapshot
    ///
    /// Only commands can fail; channel and media events are applied or
    /// dropped with a log line.
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<()> {
        let result = match event {
            SessionEvent::Channel(event) => {
                self.handle_channel_event(event).await;
                Ok(())
            }
            SessionEvent::Media(event) => {
                self.handle_media_event(event);
                Ok(())
            }
            SessionEvent::Command(command) => {
                let name = command.name();
                let result = self.execute(command).await;
                if let Err(ref e) = result {
                    tracing::debug!(command = name, error = %e, "Command rejected");
                }
                result
            }
        };

        self.publish_snapshot();
        result
    }

    /// Execute a local command
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        let effects = match command {
            Command::Join {
                local_id,
                display_name,
            } => return self.join(local_id, display_name).await,
            Command::Leave => {
                if !self.state.is_active() {
                    return Err(SessionError::NotJoined.into());
                }
                self.leave().await;
                return Ok(());
            }
            command => {
                let session = self.session.as_mut().ok_or(SessionError::NotJoined)?;
                Self::apply_command(session, command)?
            }
        };

        self.apply_effects(effects).await;
        Ok(())
    }

    /// Run the event loop until every input sender is dropped
    ///
    /// An active session is left on the way out.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<Request>) {
        tracing::debug!("Session coordinator started");

        loop {
            let deadline = self.timers.next_deadline();

            tokio::select! {
                request = inputs.recv() => {
                    let Some(Request { event, reply }) = request else {
                        break;
                    };
                    let result = self.dispatch(event).await;
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                event = next_inbound(&mut self.inbound) => match event {
                    Some(event) => {
                        let _ = self.dispatch(SessionEvent::Channel(event)).await;
                    }
                    None => {
                        self.on_channel_closed();
                        self.publish_snapshot();
                    }
                },
                () = sleep_until_deadline(deadline) => {
                    self.fire_due_timers().await;
                    self.publish_snapshot();
                }
            }
        }

        if self.state.is_active() {
            self.leave().await;
            self.publish_snapshot();
        }
        tracing::debug!("Session coordinator stopped");
    }

    async fn join(&mut self, local_id: ParticipantId, display_name: String) -> Result<()> {
        if self.state.is_active() {
            return Err(SessionError::AlreadyJoined.into());
        }

        let metadata = ParticipantMetadata::new(local_id.clone(), display_name.clone());
        self.session = Some(ActiveSession {
            local_id: local_id.clone(),
            presence: ParticipantMetadataStore::new(metadata, self.config.republish_delay),
            media: MediaPublishStateTracker::new(),
            lock: EditLockCoordinator::new(
                local_id.clone(),
                display_name,
                self.config.lock_idle_timeout,
                self.config.note_debounce,
            ),
        });
        self.timers.cancel_all();

        match self.channel.subscribe(&local_id).await {
            Ok(inbound) => {
                self.inbound = Some(inbound);
                self.state.on_join(true);
                self.timers
                    .schedule(TimerKind::Republish, self.config.initial_announce_delay);
                tracing::info!(participant = %local_id, "Joined session");
            }
            Err(e) => {
                self.inbound = None;
                self.state.on_join(false);
                tracing::warn!(
                    participant = %local_id,
                    error = %e,
                    "Signaling unavailable, continuing in local-only mode"
                );
            }
        }

        Ok(())
    }

    async fn leave(&mut self) {
        if let Some(mut session) = self.session.take() {
            let effects = session.lock.teardown();
            self.apply_effects(effects).await;
            tracing::info!(
                participant = %session.local_id,
                session_ms = self.state.duration().map_or(0, |d| d.as_millis() as u64),
                publish_attempts = self.stats.publish_attempts(),
                malformed_ratio = self.stats.malformed_ratio(),
                "Left session"
            );
        }

        self.timers.cancel_all();
        self.inbound = None;
        self.channel.unsubscribe().await;
        self.state.on_leave();
    }

    fn apply_command(
        session: &mut ActiveSession,
        command: Command,
    ) -> std::result::Result<Vec<Effect>, SessionError> {
        let effects = match command {
            Command::SetLocalScreenSharing(active) => {
                tracing::info!(participant = %session.local_id, active, "Local screen sharing changed");
                session.media.set_local_screen_sharing(&session.local_id, active);
                session.presence.set_local_screen_sharing(active)
            }
            Command::SetMicrophoneMuted(muted) => {
                tracing::debug!(muted, "Local microphone changed");
                session.media.set_microphone_muted(muted);
                Vec::new()
            }
            Command::SetCameraOff(off) => {
                tracing::debug!(off, "Local camera changed");
                session.media.set_camera_off(off);
                Vec::new()
            }
            Command::RequestLock => session.lock.request_lock(),
            Command::ReleaseLock => session.lock.release_lock()?,
            Command::EditDocument(content) => session.lock.edit_document(content)?,
            Command::Join { .. } | Command::Leave => Vec::new(),
        };
        Ok(effects)
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        let effects = match event {
            ChannelEvent::Message { publisher, payload } => self.handle_message(publisher, &payload),
            ChannelEvent::Presence(event) => self.handle_presence(event),
        };
        self.apply_effects(effects).await;
    }

    fn handle_message(&mut self, publisher: ParticipantId, payload: &[u8]) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!(publisher = %publisher, "Message received outside a session");
            return Vec::new();
        };

        if publisher == session.local_id {
            tracing::trace!("Ignoring echo of a local message");
            return Vec::new();
        }

        let message = match WireMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                self.stats.malformed_dropped += 1;
                tracing::warn!(publisher = %publisher, error = %e, "Dropping malformed message");
                return Vec::new();
            }
        };

        self.stats.messages_received += 1;
        tracing::trace!(publisher = %publisher, kind = message.kind(), "Message received");

        match message {
            WireMessage::UserMetadata(metadata) => {
                session.presence.apply_remote_metadata(&publisher, metadata);
                Vec::new()
            }
            WireMessage::LockAcquired(acquired) => session.lock.apply_remote_acquired(&acquired),
            WireMessage::LockReleased(released) => session.lock.apply_remote_released(&released),
            WireMessage::NoteUpdate(update) => {
                session.lock.apply_remote_update(&update);
                Vec::new()
            }
        }
    }

    fn handle_presence(&mut self, event: PresenceEvent) -> Vec<Effect> {
        let release_on_leave = self.config.release_lock_on_holder_leave;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match event {
            PresenceEvent::Snapshot => session.presence.on_presence_snapshot(),
            PresenceEvent::Joined(id) if id == session.local_id => Vec::new(),
            PresenceEvent::Joined(id) => {
                tracing::info!(participant = %id, "Member joined channel");
                session.presence.on_member_joined(&id)
            }
            PresenceEvent::Left(id) if id == session.local_id => Vec::new(),
            PresenceEvent::Left(id) => {
                session.presence.on_member_left(&id);
                session.media.member_left(&id);
                if release_on_leave {
                    session.lock.on_member_left(&id);
                }
                Vec::new()
            }
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(event = ?event, "Media event outside a session");
            return;
        };

        if *event.participant() == session.local_id {
            tracing::trace!("Ignoring media event for local participant");
            return;
        }
        session.media.apply(event);
    }

    fn on_channel_closed(&mut self) {
        self.inbound = None;
        self.state.on_signaling_lost();
        tracing::warn!("Signaling channel closed, continuing in local-only mode");
    }

    async fn fire_due_timers(&mut self) {
        for kind in self.timers.take_due(Instant::now()) {
            let effects = self.handle_timer(kind);
            self.apply_effects(effects).await;
        }
    }

    fn handle_timer(&mut self, kind: TimerKind) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        tracing::trace!(timer = ?kind, "Timer fired");
        match kind {
            TimerKind::Republish => vec![session.presence.announce()],
            TimerKind::NoteDebounce => session.lock.on_debounce_elapsed(),
            TimerKind::LockExpiry => {
                let effects = session.lock.on_idle_timeout();
                if !effects.is_empty() {
                    self.stats.lock_expiries += 1;
                }
                effects
            }
        }
    }

    async fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Publish(message) => self.publish(message).await,
                Effect::Schedule(kind, after) => self.timers.schedule(kind, after),
                Effect::Cancel(kind) => self.timers.cancel(kind),
            }
        }
    }

    async fn publish(&mut self, message: WireMessage) {
        if !self.state.can_publish() {
            self.stats.local_only_drops += 1;
            tracing::debug!(kind = message.kind(), "Signaling unavailable, message kept local");
            return;
        }

        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.publish_failures += 1;
                tracing::warn!(kind = message.kind(), error = %e, "Failed to encode message");
                return;
            }
        };

        match self.channel.publish(payload).await {
            Ok(()) => {
                self.stats.messages_published += 1;
                tracing::trace!(kind = message.kind(), "Message published");
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                tracing::warn!(kind = message.kind(), error = %e, "Publish failed");
            }
        }
    }

    fn publish_snapshot(&self) {
        let next = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn next_inbound(inbound: &mut Option<mpsc::Receiver<ChannelEvent>>) -> Option<ChannelEvent> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
