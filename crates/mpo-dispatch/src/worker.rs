//! One worker loop per broker queue: pulls a `Delivery`, routes it to
//! the handler for its `TaskKind`, and acks or nacks the result.
//!
//! Transcription jobs always ack -- their own retry is a fresh job the
//! handler enqueues itself, driven by the file's retry budget rather
//! than the broker's redelivery count. Every other task kind owns no
//! row besides its `Task`, so it leans on the broker's native
//! nack-and-redeliver, capped by `MAX_NON_OWNING_REDELIVERIES`.

use mpo_common::{QueueClass, TaskKind};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::context::DispatchContext;
use crate::error::DispatchError;
use crate::handlers::{analytics, summarization, transcription, url_ingest, utility};

/// How many times a non-owning task kind (everything but transcription)
/// may be redelivered by the broker before its failure is treated as
/// terminal.
pub const MAX_NON_OWNING_REDELIVERIES: u32 = 5;

/// What a handler tells the worker loop to do with the delivery it
/// just processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ack,
    Nack,
}

/// Owns one spawned loop per `QueueClass` the dispatcher serves.
pub struct Dispatcher {
    handles: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns a worker loop for every queue class and returns a handle
    /// bundling them. Dropping the returned `Dispatcher` does not stop
    /// the loops; call `shutdown` for that.
    pub fn spawn(ctx: DispatchContext) -> Self {
        let queues = [
            QueueClass::Gpu,
            QueueClass::Cpu,
            QueueClass::Nlp,
            QueueClass::Download,
            QueueClass::Utility,
        ];

        let handles = queues
            .into_iter()
            .map(|queue| {
                let ctx = ctx.clone();
                tokio::spawn(async move { run_queue_loop(queue, ctx).await })
            })
            .collect();

        Self { handles }
    }

    /// Aborts every worker loop. In-flight deliveries are left
    /// unacked; the broker's own delivery semantics recover them.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

async fn run_queue_loop(queue: QueueClass, ctx: DispatchContext) {
    info!("🔧 starting worker loop for {} queue", queue.as_str());
    loop {
        let delivery = match ctx.broker.dequeue(queue).await {
            Ok(delivery) => delivery,
            Err(e) => {
                error!("❌ {} queue dequeue failed: {e}", queue.as_str());
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
        };

        let task_id = delivery.job.task_id.clone();
        let kind = delivery.job.kind;
        let outcome = dispatch_one(&delivery, &ctx).await;

        let ack_result = match outcome {
            Ok(Outcome::Ack) => ctx.broker.ack(&task_id).await,
            Ok(Outcome::Nack) => ctx.broker.nack(&task_id).await,
            Err(e) => {
                error!("❌ unhandled error routing {kind:?} task {task_id}: {e}");
                ctx.broker.ack(&task_id).await
            }
        };
        if let Err(e) = ack_result {
            warn!("⚠️ failed to settle delivery for task {task_id}: {e}");
        }
    }
}

#[instrument(level = "debug", skip(ctx, delivery), fields(task_id = %delivery.job.task_id, kind = ?delivery.job.kind))]
async fn dispatch_one(
    delivery: &mpo_broker::job::Delivery,
    ctx: &DispatchContext,
) -> Result<Outcome, DispatchError> {
    match delivery.job.kind {
        TaskKind::Transcription => transcription::handle(delivery, ctx).await,
        TaskKind::UrlIngest => url_ingest::handle(delivery, ctx).await,
        TaskKind::Summarization => summarization::handle(delivery, ctx).await,
        TaskKind::Analytics => analytics::handle(delivery, ctx).await,
        TaskKind::Waveform => utility::handle_waveform(delivery, ctx).await,
        TaskKind::Reindex => utility::handle_reindex(delivery, ctx).await,
    }
}
