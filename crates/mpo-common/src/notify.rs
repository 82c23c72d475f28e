//! The notification envelope pushed over the per-user event stream.
//!
//! Shared between `mpo-tlm` (which constructs events as it drives state
//! transitions) and `mpo-notify` (which serializes and fans them out),
//! so the wire shape lives in one place instead of being duplicated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Event kind, matching the set a client subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TranscriptionStatus,
    SummarizationStatus,
    FileDeleted,
    FileUpdated,
    RecoverySuggested,
}

/// A single event on a user's notification stream. `id` is a monotonic,
/// per-connection sequence number assigned by `mpo-notify` at send time,
/// not set by the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Build an event with `id` left at zero; `mpo-notify` overwrites it
    /// with the next sequence number for the target connection before
    /// sending.
    pub fn new(kind: NotificationKind, data: Value) -> Self {
        Self {
            id: 0,
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn transcription_status(owner: Uuid, file_id: Uuid, status: &str) -> Self {
        Self::new(
            NotificationKind::TranscriptionStatus,
            serde_json::json!({ "owner": owner, "file_id": file_id, "status": status }),
        )
    }

    pub fn file_deleted(owner: Uuid, file_id: Uuid) -> Self {
        Self::new(
            NotificationKind::FileDeleted,
            serde_json::json!({ "owner": owner, "file_id": file_id }),
        )
    }
}

/// Seam `mpo-tlm` publishes events through and `mpo-notify`'s bus
/// implements, so the Task Lifecycle Manager never depends on the
/// concrete notification transport -- the same pattern as
/// `mpo_core::traits::ProgressSink`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, owner: Uuid, event: NotificationEvent) -> mpo_core::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_status_carries_expected_fields() {
        let owner = Uuid::nil();
        let file_id = Uuid::nil();
        let event = NotificationEvent::transcription_status(owner, file_id, "completed");
        assert_eq!(event.kind, NotificationKind::TranscriptionStatus);
        assert_eq!(event.data["status"], "completed");
    }

    #[test]
    fn event_type_serializes_under_type_key() {
        let event = NotificationEvent::file_deleted(Uuid::nil(), Uuid::nil());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "file_deleted");
    }
}
