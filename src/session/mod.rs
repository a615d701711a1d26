//! Session composition
//!
//! Wires the metadata store, the media tracker and the edit lock to one
//! signaling channel and one outward snapshot.
//!
//! This module provides:
//! - `SessionCoordinator`: the single-task event dispatcher
//! - `SessionHandle`: a cloneable front end that spawns and drives it
//! - `SessionConfig`: named protocol delays
//! - `SessionSnapshot`: the read-only view for UI consumers

pub mod command;
pub mod config;
pub mod coordinator;
pub mod handle;
pub mod snapshot;
pub mod state;
pub mod timer;

pub use command::{Command, Request, SessionEvent};
pub use config::SessionConfig;
pub use coordinator::SessionCoordinator;
pub use handle::SessionHandle;
pub use snapshot::{LockView, ParticipantView, ScreenSharingView, SessionSnapshot};
pub use state::{SessionPhase, SessionState, SignalingStatus};
