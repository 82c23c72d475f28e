//! The unit of work a queue carries, and a handle to a dequeued
//! instance of one. Dynamic-typed payloads in the source become this
//! explicit tagged struct; the payload itself stays an opaque JSON
//! value the dispatcher deserializes per `TaskKind`.

use mpo_common::{QueueClass, TaskKind};
use serde_json::Value;
use uuid::Uuid;

/// A job as stored in a queue, independent of any particular delivery.
#[derive(Debug, Clone)]
pub struct Job {
    pub task_id: String,
    pub kind: TaskKind,
    pub queue: QueueClass,
    pub payload: Value,
}

impl Job {
    pub fn new(kind: TaskKind, payload: Value) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            queue: kind.queue_class(),
            kind,
            payload,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }
}

/// A dequeued job plus delivery bookkeeping the consumer must report
/// back on (`ack`/`nack`) to release the concurrency permit and redrive
/// redelivery counting.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub job: Job,
    /// How many times this job has been delivered, including this one.
    /// `1` on first delivery; the broker increments it on every `nack`
    /// that re-enqueues the job.
    pub redelivery_count: u32,
}
