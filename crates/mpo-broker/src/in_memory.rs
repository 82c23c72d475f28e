//! Per-process `Broker`, the same shape as a durable broker (Redis
//! streams, RabbitMQ) but backed by `tokio::sync::mpsc` channels and a
//! `Semaphore` per queue instead of network I/O, so `mpo-dispatch` and
//! `mpo-tlm` code against the `Broker` trait only and a real broker is
//! a drop-in substitution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, gauge};
use mpo_common::QueueClass;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, warn};

use crate::error::{BrokerError, Result};
use crate::job::{Delivery, Job};
use crate::traits::Broker;

struct QueueHandle {
    tx: mpsc::UnboundedSender<Job>,
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
    concurrency: Arc<Semaphore>,
}

/// An in-process broker with one bounded-concurrency queue per
/// `QueueClass`. Construct with [`InMemoryBroker::new`] passing the
/// concurrency limit for each queue (the `gpu` queue must be built with
/// exactly 1 to honor §5's single-active-GPU-task policy).
pub struct InMemoryBroker {
    queues: HashMap<QueueClass, QueueHandle>,
    /// In-flight deliveries: the job (so `nack` can requeue it without
    /// the caller resubmitting it) plus the permit held until
    /// `ack`/`nack`.
    in_flight: Mutex<HashMap<String, (Job, OwnedSemaphorePermit)>>,
    /// Times each task id has been delivered so far, so redelivery is
    /// visible to consumers even across separate `nack`-then-`dequeue`
    /// round trips. Cleared on `ack`.
    delivery_counts: Mutex<HashMap<String, u32>>,
    cancelled: Mutex<HashSet<String>>,
}

/// Per-queue concurrency limits, mirroring `BrokerConfig`.
pub struct QueueConcurrency {
    pub gpu: usize,
    pub cpu: usize,
    pub nlp: usize,
    pub download: usize,
    pub utility: usize,
}

impl InMemoryBroker {
    pub fn new(limits: QueueConcurrency) -> Self {
        let mut queues = HashMap::new();
        for (class, limit) in [
            (QueueClass::Gpu, limits.gpu),
            (QueueClass::Cpu, limits.cpu),
            (QueueClass::Nlp, limits.nlp),
            (QueueClass::Download, limits.download),
            (QueueClass::Utility, limits.utility),
        ] {
            let (tx, rx) = mpsc::unbounded_channel();
            queues.insert(
                class,
                QueueHandle {
                    tx,
                    rx: Mutex::new(rx),
                    concurrency: Arc::new(Semaphore::new(limit.max(1))),
                },
            );
        }

        Self {
            queues,
            in_flight: Mutex::new(HashMap::new()),
            delivery_counts: Mutex::new(HashMap::new()),
            cancelled: Mutex::new(HashSet::new()),
        }
    }

    fn queue(&self, class: QueueClass) -> Result<&QueueHandle> {
        self.queues
            .get(&class)
            .ok_or_else(|| BrokerError::UnknownQueue(class.to_string()))
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    #[instrument(level = "debug", skip(self, job))]
    async fn enqueue(&self, job: Job) -> Result<()> {
        let queue = self.queue(job.queue)?;
        debug!("🔧 enqueueing task {} on queue {}", job.task_id, job.queue);
        counter!("broker.enqueued", "queue" => job.queue.to_string()).increment(1);
        gauge!("broker.queue_depth", "queue" => job.queue.to_string()).increment(1.0);
        queue
            .tx
            .send(job)
            .map_err(|e| BrokerError::Closed(e.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    async fn dequeue(&self, queue: QueueClass) -> Result<Delivery> {
        let handle = self.queue(queue)?;
        let permit = handle
            .concurrency
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BrokerError::Closed(e.to_string()))?;

        let job = {
            let mut rx = handle.rx.lock().await;
            rx.recv()
                .await
                .ok_or_else(|| BrokerError::Closed(queue.to_string()))?
        };
        gauge!("broker.queue_depth", "queue" => queue.to_string()).decrement(1.0);

        let redelivery_count = {
            let mut counts = self.delivery_counts.lock().await;
            let count = counts.entry(job.task_id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        self.in_flight
            .lock()
            .await
            .insert(job.task_id.clone(), (job.clone(), permit));

        Ok(Delivery {
            job,
            redelivery_count,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn ack(&self, task_id: &str) -> Result<()> {
        self.in_flight
            .lock()
            .await
            .remove(task_id)
            .ok_or_else(|| BrokerError::NotFound(task_id.to_string()))?;
        self.delivery_counts.lock().await.remove(task_id);
        self.cancelled.lock().await.remove(task_id);
        counter!("broker.acked", 1);
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn nack(&self, task_id: &str) -> Result<()> {
        let (job, permit) = self
            .in_flight
            .lock()
            .await
            .remove(task_id)
            .ok_or_else(|| BrokerError::NotFound(task_id.to_string()))?;
        // Dropping the permit releases the slot before requeueing, so a
        // `nack` never deadlocks a queue at its concurrency limit.
        drop(permit);

        warn!("⚠️ nack task {task_id}, re-enqueueing");
        counter!("broker.nacked", 1);
        let queue = self.queue(job.queue)?;
        gauge!("broker.queue_depth", "queue" => job.queue.to_string()).increment(1.0);
        queue
            .tx
            .send(job)
            .map_err(|e| BrokerError::Closed(e.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    async fn request_cancel(&self, task_id: &str) -> Result<()> {
        self.cancelled.lock().await.insert(task_id.to_string());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn is_cancelled(&self, task_id: &str) -> Result<bool> {
        Ok(self.cancelled.lock().await.contains(task_id))
    }

    #[instrument(level = "debug", skip(self))]
    async fn queue_depth(&self, queue: QueueClass) -> Result<usize> {
        let handle = self.queue(queue)?;
        Ok(handle.rx.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpo_common::TaskKind;
    use serde_json::json;

    fn broker() -> InMemoryBroker {
        InMemoryBroker::new(QueueConcurrency {
            gpu: 1,
            cpu: 2,
            nlp: 1,
            download: 1,
            utility: 1,
        })
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips_the_job() {
        let broker = broker();
        let job = Job::new(TaskKind::Transcription, json!({"file_id": "f1"}));
        let task_id = job.task_id.clone();
        broker.enqueue(job).await.unwrap();

        let delivery = broker.dequeue(QueueClass::Gpu).await.unwrap();
        assert_eq!(delivery.job.task_id, task_id);
        assert_eq!(delivery.redelivery_count, 1);

        broker.ack(&task_id).await.unwrap();
    }

    #[tokio::test]
    async fn gpu_queue_allows_only_one_concurrent_delivery() {
        let broker = broker();
        broker
            .enqueue(Job::new(TaskKind::Transcription, json!({})))
            .await
            .unwrap();
        broker
            .enqueue(Job::new(TaskKind::Transcription, json!({})))
            .await
            .unwrap();

        let first = broker.dequeue(QueueClass::Gpu).await.unwrap();

        let second = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            broker.dequeue(QueueClass::Gpu),
        )
        .await;
        assert!(second.is_err(), "second dequeue should block on the permit");

        broker.ack(&first.job.task_id).await.unwrap();
        let second = broker.dequeue(QueueClass::Gpu).await.unwrap();
        broker.ack(&second.job.task_id).await.unwrap();
    }

    #[tokio::test]
    async fn nack_redrives_and_bumps_redelivery_count() {
        let broker = broker();
        let job = Job::new(TaskKind::Analytics, json!({}));
        let task_id = job.task_id.clone();
        broker.enqueue(job).await.unwrap();

        let first = broker.dequeue(QueueClass::Cpu).await.unwrap();
        assert_eq!(first.redelivery_count, 1);
        broker.nack(&task_id).await.unwrap();

        let second = broker.dequeue(QueueClass::Cpu).await.unwrap();
        assert_eq!(second.redelivery_count, 2);
        broker.ack(&task_id).await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_is_flagged_and_idempotent_to_check() {
        let broker = broker();
        assert!(!broker.is_cancelled("t1").await.unwrap());
        broker.request_cancel("t1").await.unwrap();
        assert!(broker.is_cancelled("t1").await.unwrap());
        assert!(broker.is_cancelled("t1").await.unwrap());
    }
}
