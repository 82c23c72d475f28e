//! Everything a worker loop needs to route and run a job, bundled so
//! `Dispatcher::new` takes one value instead of a dozen constructor
//! arguments.

use std::sync::Arc;

use mpo_broker::Broker;
use mpo_core::config::ConfigHandle;
use mpo_db::analytics::AnalyticsRepo;
use mpo_db::media_file::MediaFileRepo;
use mpo_db::segment::SegmentRepo;
use mpo_db::speaker::SpeakerRepo;
use mpo_db::task::TaskRepo;
use mpo_index::IndexGateway;
use mpo_ingest::IngestionCoordinator;
use mpo_pipelines::{Diarizer, Downloader, SecretsProvider, Summarizer, Transcriber};
use mpo_storage::ObjectStore;
use mpo_tlm::TaskLifecycleManager;

/// Shared, cheaply-clonable handle passed to every worker loop and
/// handler. Repositories (`MediaFileRepo`, `TaskRepo`, ...) wrap a
/// `sqlx::PgPool` internally and are `Clone` already; everything
/// resolved behind a trait object is `Arc`'d explicitly.
#[derive(Clone)]
pub struct DispatchContext {
    pub media_files: MediaFileRepo,
    pub tasks: TaskRepo,
    pub segments: SegmentRepo,
    pub speakers: SpeakerRepo,
    pub analytics: AnalyticsRepo,
    pub store: Arc<dyn ObjectStore>,
    pub index: Arc<dyn IndexGateway>,
    pub broker: Arc<dyn Broker>,
    pub tlm: Arc<TaskLifecycleManager>,
    pub ingest: Arc<IngestionCoordinator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub diarizer: Arc<dyn Diarizer>,
    pub summarizer: Arc<dyn Summarizer>,
    pub secrets: Arc<dyn SecretsProvider>,
    pub downloader: Arc<dyn Downloader>,
    pub config: ConfigHandle,
}
