//! Wire messages
//!
//! Every message is a JSON envelope `{"type": ..., "data": {...}}`:
//!
//! | type                 | data                                  |
//! |----------------------|---------------------------------------|
//! | `USER_METADATA`      | `{uid, displayName, isScreenSharing}` |
//! | `NOTE_LOCK_ACQUIRED` | `{userId, displayName, timestamp}`    |
//! | `NOTE_LOCK_RELEASED` | `{userId, timestamp}`                 |
//! | `NOTE_UPDATE`        | `{content, userId, timestamp}`        |
//!
//! Timestamps are milliseconds since the Unix epoch.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::presence::{ParticipantId, ParticipantMetadata};

pub const USER_METADATA: &str = "USER_METADATA";
pub const NOTE_LOCK_ACQUIRED: &str = "NOTE_LOCK_ACQUIRED";
pub const NOTE_LOCK_RELEASED: &str = "NOTE_LOCK_RELEASED";
pub const NOTE_UPDATE: &str = "NOTE_UPDATE";

/// `NOTE_LOCK_ACQUIRED` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockAcquired {
    pub user_id: ParticipantId,
    pub display_name: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// `NOTE_LOCK_RELEASED` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockReleased {
    pub user_id: ParticipantId,
    #[serde(default)]
    pub timestamp: i64,
}

/// `NOTE_UPDATE` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    pub content: String,
    pub user_id: ParticipantId,
    #[serde(default)]
    pub timestamp: i64,
}

/// Signaling message carried on the broadcast channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WireMessage {
    #[serde(rename = "USER_METADATA")]
    UserMetadata(ParticipantMetadata),
    #[serde(rename = "NOTE_LOCK_ACQUIRED")]
    LockAcquired(LockAcquired),
    #[serde(rename = "NOTE_LOCK_RELEASED")]
    LockReleased(LockReleased),
    #[serde(rename = "NOTE_UPDATE")]
    NoteUpdate(NoteUpdate),
}

/// Envelope decoded before the payload, so unknown types are reported as such
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl WireMessage {
    /// Wire type name
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::UserMetadata(_) => USER_METADATA,
            WireMessage::LockAcquired(_) => NOTE_LOCK_ACQUIRED,
            WireMessage::LockReleased(_) => NOTE_LOCK_RELEASED,
            WireMessage::NoteUpdate(_) => NOTE_UPDATE,
        }
    }

    /// Serialize to a JSON payload
    pub fn encode(&self) -> Result<Bytes, MessageError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(MessageError::Encode)
    }

    /// Parse a JSON payload
    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        let envelope: Envelope =
            serde_json::from_slice(payload).map_err(MessageError::InvalidEnvelope)?;

        let parsed = match envelope.kind.as_str() {
            USER_METADATA => serde_json::from_value(envelope.data).map(WireMessage::UserMetadata),
            NOTE_LOCK_ACQUIRED => {
                serde_json::from_value(envelope.data).map(WireMessage::LockAcquired)
            }
            NOTE_LOCK_RELEASED => {
                serde_json::from_value(envelope.data).map(WireMessage::LockReleased)
            }
            NOTE_UPDATE => serde_json::from_value(envelope.data).map(WireMessage::NoteUpdate),
            _ => return Err(MessageError::UnknownType(envelope.kind.clone())),
        };

        parsed.map_err(|source| MessageError::InvalidPayload {
            kind: envelope.kind,
            source,
        })
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn timestamp_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let message = WireMessage::LockAcquired(LockAcquired {
            user_id: "alice".into(),
            display_name: "Alice".into(),
            timestamp: 1_700_000_000_000,
        });

        let value: serde_json::Value = serde_json::from_slice(&message.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "NOTE_LOCK_ACQUIRED");
        assert_eq!(value["data"]["userId"], "alice");
        assert_eq!(value["data"]["displayName"], "Alice");
        assert_eq!(value["data"]["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_decode_foreign_client_payloads() {
        let metadata = br#"{"type":"USER_METADATA","data":{"uid":42,"displayName":"Grace"}}"#;
        match WireMessage::decode(metadata).unwrap() {
            WireMessage::UserMetadata(m) => {
                assert_eq!(m.id.as_str(), "42");
                assert!(!m.is_screen_sharing);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let release = br#"{"type":"NOTE_LOCK_RELEASED","data":{"userId":"u1"}}"#;
        assert_eq!(
            WireMessage::decode(release).unwrap(),
            WireMessage::LockReleased(LockReleased {
                user_id: "u1".into(),
                timestamp: 0,
            })
        );

        let update =
            br#"{"type":"NOTE_UPDATE","data":{"content":"<p>hi</p>","userId":"u1","timestamp":5}}"#;
        match WireMessage::decode(update).unwrap() {
            WireMessage::NoteUpdate(u) => assert_eq!(u.content, "<p>hi</p>"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_not_json() {
        let err = WireMessage::decode(b"hello").unwrap_err();
        assert!(matches!(err, MessageError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_decode_unknown_type() {
        let err = WireMessage::decode(br#"{"type":"CURSOR_MOVE","data":{}}"#).unwrap_err();
        assert!(matches!(err, MessageError::UnknownType(ref kind) if kind == "CURSOR_MOVE"));
    }

    #[test]
    fn test_decode_bad_payload() {
        let err = WireMessage::decode(br#"{"type":"NOTE_UPDATE","data":{"userId":"u1"}}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::InvalidPayload { ref kind, .. } if kind == NOTE_UPDATE));

        let err = WireMessage::decode(br#"{"type":"NOTE_LOCK_ACQUIRED"}"#).unwrap_err();
        assert!(matches!(err, MessageError::InvalidPayload { .. }));
    }

    #[test]
    fn test_kind_names() {
        let message = WireMessage::NoteUpdate(NoteUpdate {
            content: String::new(),
            user_id: "u".into(),
            timestamp: 0,
        });
        assert_eq!(message.kind(), "NOTE_UPDATE");
    }

    #[test]
    fn test_timestamp_is_epoch_millis() {
        // 2020-09-13 in milliseconds
        assert!(timestamp_now() > 1_600_000_000_000);
    }
}
