//! Shared session state over an unreliable broadcast channel
//!
//! Participants of a live session agree, eventually, on who is present,
//! what each one is doing with their media, who may edit the shared
//! document and what that document says. There is no server-side arbiter:
//! every client broadcasts its own state and converges on what it hears.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────────────┐
//!   SessionHandle ───► │  SessionCoordinator  │ ───► watch<SessionSnapshot>
//!   (commands, media)  │   (one tokio task)   │
//!                      └──┬──────┬──────┬─────┘
//!                         │      │      │
//!          ParticipantMetadata  Media   EditLock
//!                Store        Tracker   Coordinator
//!                         │      │      │
//!                         └──────┴──────┘
//!                        Vec<Effect> (publish, timers)
//!                                │
//!                                ▼
//!                       SignalingChannel (JSON {type, data})
//! ```
//!
//! The edit lock is advisory: the last `NOTE_LOCK_ACQUIRED` seen wins, and
//! two concurrent acquirers can both believe they hold it until the next
//! message arrives.
//!
//! # Example
//!
//! ```no_run
//! use huddle_sync::channel::MemoryHub;
//! use huddle_sync::{SessionConfig, SessionHandle};
//!
//! # async fn example() -> huddle_sync::Result<()> {
//! let hub = MemoryHub::new();
//! let (alice, _) = SessionHandle::spawn(SessionConfig::default(), hub.endpoint());
//! let (bob, _) = SessionHandle::spawn(SessionConfig::default(), hub.endpoint());
//!
//! alice.join("alice", "Alice").await?;
//! bob.join("bob", "Bob").await?;
//!
//! alice.request_lock().await?;
//! alice.edit_document("Agenda").await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod effect;
pub mod error;
pub mod lock;
pub mod media;
pub mod presence;
pub mod session;
pub mod stats;

pub use channel::{MemoryChannel, MemoryHub, SignalingChannel};
pub use error::{Error, Result};
pub use presence::{ParticipantId, ParticipantMetadata};
pub use session::{Command, SessionConfig, SessionCoordinator, SessionHandle, SessionSnapshot};
