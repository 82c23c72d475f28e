//! Lifecycle enums for `MediaFile` and `Task` rows, stored as Postgres
//! `TEXT` via `sqlx::Type` so the schema stays human-readable.

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// `MediaFile.status`. See the state diagram owned by `mpo-tlm` for the
/// legal transitions between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Cancelling,
    Cancelled,
    Orphaned,
}

impl FileStatus {
    /// `active_task_id` is non-null iff the file is in one of these.
    pub fn has_active_task(&self) -> bool {
        matches!(self, FileStatus::Processing | FileStatus::Cancelling)
    }

    /// Terminal for the current task instance; a retry starts a new one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FileStatus::Completed | FileStatus::Cancelled | FileStatus::Error
        )
    }
}

/// `Task.kind`: which pipeline a queued job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Transcription,
    Summarization,
    Analytics,
    UrlIngest,
    Waveform,
    Reindex,
}

impl TaskKind {
    /// Which broker queue class a task of this kind is routed to.
    pub fn queue_class(&self) -> QueueClass {
        match self {
            TaskKind::Transcription => QueueClass::Gpu,
            TaskKind::Summarization => QueueClass::Nlp,
            TaskKind::Analytics => QueueClass::Cpu,
            TaskKind::UrlIngest => QueueClass::Download,
            TaskKind::Waveform => QueueClass::Cpu,
            TaskKind::Reindex => QueueClass::Utility,
        }
    }
}

/// `Task.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Summarization status, tracked independently of the file's overall
/// status since it `not_configured`s per-file rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SummarizationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    NotConfigured,
}

/// Broker queue capability class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueClass {
    Gpu,
    Cpu,
    Nlp,
    Download,
    Utility,
}

impl QueueClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueClass::Gpu => "gpu",
            QueueClass::Cpu => "cpu",
            QueueClass::Nlp => "nlp",
            QueueClass::Download => "download",
            QueueClass::Utility => "utility",
        }
    }
}

impl std::fmt::Display for QueueClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_task_tracks_processing_and_cancelling_only() {
        assert!(FileStatus::Processing.has_active_task());
        assert!(FileStatus::Cancelling.has_active_task());
        assert!(!FileStatus::Pending.has_active_task());
        assert!(!FileStatus::Completed.has_active_task());
        assert!(!FileStatus::Orphaned.has_active_task());
    }

    #[test]
    fn terminal_statuses_match_spec() {
        assert!(FileStatus::Completed.is_terminal());
        assert!(FileStatus::Cancelled.is_terminal());
        assert!(FileStatus::Error.is_terminal());
        assert!(!FileStatus::Pending.is_terminal());
        assert!(!FileStatus::Processing.is_terminal());
        assert!(!FileStatus::Orphaned.is_terminal());
    }

    #[test]
    fn task_kind_routes_to_expected_queue() {
        assert_eq!(TaskKind::Transcription.queue_class(), QueueClass::Gpu);
        assert_eq!(TaskKind::Summarization.queue_class(), QueueClass::Nlp);
        assert_eq!(TaskKind::UrlIngest.queue_class(), QueueClass::Download);
        assert_eq!(TaskKind::Reindex.queue_class(), QueueClass::Utility);
    }

    #[test]
    fn queue_class_display_matches_queue_name() {
        assert_eq!(QueueClass::Gpu.to_string(), "gpu");
        assert_eq!(QueueClass::Download.to_string(), "download");
    }
}
