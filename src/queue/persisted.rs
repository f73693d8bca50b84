//! On-disk layout of the queue blob.
//!
//! Current layout: `{"version": 1, "actions": [...]}`. Blobs written before
//! versioning are a bare JSON array and are read as version 0.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::action::QueuedAction;
use crate::error::SyncError;

/// Layout version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    actions: &'a [QueuedAction],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[serde(default)]
    actions: Vec<QueuedAction>,
}

/// A successfully decoded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Layout version the blob was written with
    pub version: u32,
    /// Queued actions, in stored order
    pub actions: Vec<QueuedAction>,
}

impl Decoded {
    /// Whether the blob predates the current layout.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.version < FORMAT_VERSION
    }
}

/// Serialize the queue in the current layout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(actions: &[QueuedAction]) -> Result<String, SyncError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: FORMAT_VERSION,
        actions,
    })?)
}

/// Parse a stored blob in any known layout.
///
/// # Errors
///
/// Returns an error if the blob is not valid JSON, has an unexpected shape,
/// or was written by a newer layout version.
pub fn decode(blob: &str) -> Result<Decoded, SyncError> {
    let value: Value = serde_json::from_str(blob)?;

    if value.is_array() {
        return Ok(Decoded {
            version: 0,
            actions: serde_json::from_value(value)?,
        });
    }

    if !value.is_object() {
        return Err(SyncError::Parse(
            "Queue blob is neither an array nor an object".to_string(),
        ));
    }

    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| SyncError::Parse("Queue blob has no version field".to_string()))?;
    if version > u64::from(FORMAT_VERSION) {
        return Err(SyncError::Parse(format!(
            "Queue blob version {version} is newer than supported version {FORMAT_VERSION}"
        )));
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    Ok(Decoded {
        version: envelope.version,
        actions: envelope.actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::action::{CompletionAction, PlanType};
    use chrono::NaiveDate;

    fn sample() -> QueuedAction {
        QueuedAction::new(
            "item-1",
            PlanType::Diet,
            NaiveDate::from_ymd_opt(2026, 1, 27).unwrap(),
            CompletionAction::Complete,
        )
    }

    #[test]
    fn test_encode_writes_version() {
        let blob = encode(&[sample()]).unwrap();
        assert!(blob.starts_with("{\"version\":1,"));

        let decoded = decode(&blob).unwrap();
        assert_eq!(decoded.version, FORMAT_VERSION);
        assert_eq!(decoded.actions.len(), 1);
        assert!(!decoded.is_stale());
    }

    #[test]
    fn test_empty_queue_encodes_empty_array() {
        let blob = encode(&[]).unwrap();
        assert_eq!(blob, r#"{"version":1,"actions":[]}"#);
    }

    #[test]
    fn test_decode_legacy_array() {
        let blob = r#"[{
            "id": "1769500000000-abc",
            "sourceId": "item-1",
            "planType": "diet",
            "completedDate": "2026-01-27",
            "action": "complete",
            "queuedAt": 1769500000000,
            "attempts": 0
        }]"#;

        let decoded = decode(blob).unwrap();
        assert_eq!(decoded.version, 0);
        assert!(decoded.is_stale());
        assert_eq!(decoded.actions[0].id, "1769500000000-abc");
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode(r#"{"version":2,"actions":[]}"#).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode("42").is_err());
        assert!(decode(r#"{"actions":[]}"#).is_err());
        assert!(decode(r#"[{"sourceId": 7}]"#).is_err());
    }
}
