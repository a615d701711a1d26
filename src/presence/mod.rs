//! Participant identity and metadata
//!
//! Presence is never queried. Each participant broadcasts its own
//! metadata and every client keeps the last message seen per sender,
//! dropping entries when the channel reports the member as gone.

pub mod store;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use store::{MetadataMap, ParticipantMetadataStore};

/// Opaque participant identity, stable for the lifetime of a session
///
/// Clients disagree on whether ids are strings or integers, so both
/// decode to the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ParticipantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Unsigned(id) => Self(id.to_string()),
            RawId::Signed(id) => Self(id.to_string()),
        })
    }
}

/// Last-known metadata for one participant
///
/// Doubles as the `USER_METADATA` wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantMetadata {
    /// Participant the metadata describes
    #[serde(rename = "uid")]
    pub id: ParticipantId,

    /// Name shown to other participants
    pub display_name: String,

    /// Whether the participant announces an active screen share
    #[serde(default)]
    pub is_screen_sharing: bool,
}

impl ParticipantMetadata {
    /// Create metadata for a participant that is not screen sharing
    pub fn new(id: ParticipantId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_screen_sharing: false,
        }
    }
}

/// Name shown for a participant with no known metadata
pub fn fallback_display_name(id: &ParticipantId) -> String {
    format!("User {}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_accepts_string_and_number() {
        let from_text: ParticipantId = serde_json::from_str("\"4711\"").unwrap();
        let from_number: ParticipantId = serde_json::from_str("4711").unwrap();

        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"4711\"");
    }

    #[test]
    fn test_id_accepts_full_unsigned_range() {
        let max: ParticipantId = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(max.as_str(), "18446744073709551615");

        let negative: ParticipantId = serde_json::from_str("-7").unwrap();
        assert_eq!(negative.as_str(), "-7");

        let json = r#"{"uid":9223372036854775808,"displayName":"Big"}"#;
        let metadata: ParticipantMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.id, ParticipantId::from(9_223_372_036_854_775_808u64));
    }

    #[test]
    fn test_metadata_wire_fields() {
        let json = r#"{"uid": 12, "displayName": "Ada"}"#;
        let metadata: ParticipantMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.id, ParticipantId::from(12));
        assert_eq!(metadata.display_name, "Ada");
        assert!(!metadata.is_screen_sharing);

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["uid"], "12");
        assert_eq!(value["isScreenSharing"], false);
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_display_name(&"u7".into()), "User u7");
    }
}
