//! Error types
//!
//! Nothing in this crate is fatal to a session. Errors surface either as a
//! log line (inbound and outbound signaling) or as the return value of a
//! local command.

use std::fmt;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Signaling transport error
    Channel(ChannelError),
    /// Wire message could not be encoded or decoded
    Message(MessageError),
    /// Local command rejected
    Session(SessionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Channel(e) => write!(f, "Channel error: {}", e),
            Error::Message(e) => write!(f, "Message error: {}", e),
            Error::Session(e) => write!(f, "Session error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Channel(e) => Some(e),
            Error::Message(e) => Some(e),
            Error::Session(e) => Some(e),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl From<MessageError> for Error {
    fn from(e: MessageError) -> Self {
        Error::Message(e)
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Error::Session(e)
    }
}

/// Signaling transport errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Transport could not connect or authenticate
    InitFailed(String),
    /// Outbound broadcast was rejected
    PublishFailed(String),
    /// Publish attempted before subscribing
    NotSubscribed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::InitFailed(reason) => write!(f, "Channel init failed: {}", reason),
            ChannelError::PublishFailed(reason) => write!(f, "Publish failed: {}", reason),
            ChannelError::NotSubscribed => write!(f, "Not subscribed to channel"),
        }
    }
}

impl std::error::Error for ChannelError {}

/// Wire message errors
#[derive(Debug)]
pub enum MessageError {
    /// Payload is not a `{type, data}` JSON object
    InvalidEnvelope(serde_json::Error),
    /// Envelope carries a type this crate does not understand
    UnknownType(String),
    /// Known type with a malformed `data` object
    InvalidPayload {
        kind: String,
        source: serde_json::Error,
    },
    /// Outbound message could not be serialized
    Encode(serde_json::Error),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::InvalidEnvelope(e) => write!(f, "Invalid message envelope: {}", e),
            MessageError::UnknownType(kind) => write!(f, "Unknown message type: {}", kind),
            MessageError::InvalidPayload { kind, source } => {
                write!(f, "Invalid {} payload: {}", kind, source)
            }
            MessageError::Encode(e) => write!(f, "Failed to encode message: {}", e),
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MessageError::InvalidEnvelope(e) | MessageError::Encode(e) => Some(e),
            MessageError::InvalidPayload { source, .. } => Some(source),
            MessageError::UnknownType(_) => None,
        }
    }
}

/// Local command errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Command requires an active session
    NotJoined,
    /// Join issued while a session is active
    AlreadyJoined,
    /// Edit or release issued by a participant that does not hold the edit lock
    NotLockHolder,
    /// Coordinator task has stopped
    Closed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotJoined => write!(f, "Not joined to a session"),
            SessionError::AlreadyJoined => write!(f, "Already joined to a session"),
            SessionError::NotLockHolder => write!(f, "Local participant does not hold the edit lock"),
            SessionError::Closed => write!(f, "Session coordinator closed"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_wraps_inner() {
        let err: Error = ChannelError::InitFailed("auth rejected".into()).into();
        assert_eq!(
            err.to_string(),
            "Channel error: Channel init failed: auth rejected"
        );

        let err: Error = SessionError::NotLockHolder.into();
        assert!(err.to_string().contains("edit lock"));
    }

    #[test]
    fn test_payload_error_source() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = MessageError::InvalidPayload {
            kind: "NOTE_UPDATE".into(),
            source,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Invalid NOTE_UPDATE payload"));
        assert!(MessageError::UnknownType("PING".into()).source().is_none());
    }
}
