//! Domain types shared by multiple orchestrator components, as opposed
//! to `mpo-core`'s generic infrastructure (error, config, traits).

pub mod failure;
pub mod notify;
pub mod status;

pub use failure::FailureKind;
pub use notify::{EventPublisher, NotificationEvent, NotificationKind};
pub use status::{FileStatus, QueueClass, SummarizationStatus, TaskKind, TaskStatus};
