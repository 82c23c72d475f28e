//! `Broker`: the seam `mpo-ingest` enqueues through and `mpo-dispatch`
//! consumes through. Named queues map 1:1 to `QueueClass`; redelivery is
//! exposed to consumers so `mpo-tlm` can tell a first attempt from a
//! retry. Cancellation is cooperative: the broker only flags a task id,
//! it never kills an in-flight delivery.

use async_trait::async_trait;
use mpo_common::QueueClass;

use crate::error::Result;
use crate::job::{Delivery, Job};

#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueues `job` onto the queue named by its `TaskKind`.
    async fn enqueue(&self, job: Job) -> Result<()>;

    /// Pulls the next job off `queue`, blocking until one is available
    /// and a concurrency permit for that queue is free. The permit is
    /// held until `ack`/`nack` is called with the same `task_id`.
    async fn dequeue(&self, queue: QueueClass) -> Result<Delivery>;

    /// Marks a delivery as terminally handled (success or non-retryable
    /// failure), releasing its concurrency permit.
    async fn ack(&self, task_id: &str) -> Result<()>;

    /// Marks a delivery as failed but retryable: releases its
    /// concurrency permit and re-enqueues the job with an incremented
    /// redelivery count.
    async fn nack(&self, task_id: &str) -> Result<()>;

    /// Cooperative cancellation flag, set by the owner of a task
    /// (typically `mpo-tlm` on a cancel request) and polled by the
    /// consumer at its suspension points.
    async fn request_cancel(&self, task_id: &str) -> Result<()>;

    async fn is_cancelled(&self, task_id: &str) -> Result<bool>;

    /// Depth of the named queue, used by metrics and the dispatcher's
    /// readiness reporting.
    async fn queue_depth(&self, queue: QueueClass) -> Result<usize>;
}
