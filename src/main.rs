//! `mpo`: the orchestrator process entry point. Loads configuration,
//! wires every component crate's concrete implementations behind the
//! trait seams they were built against, starts the Job Dispatcher's
//! worker loops, the Recovery Reaper's sweep scheduler, and the
//! Notification Bus's websocket router, and blocks until shutdown is
//! requested.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mpo_core::config::{ConfigHandle, MpoConfig};
use mpo_core::retry::Backoff;
use mpo_db::analytics::AnalyticsRepo;
use mpo_db::media_file::MediaFileRepo;
use mpo_db::migrations;
use mpo_db::pool::DatabasePool;
use mpo_db::segment::SegmentRepo;
use mpo_db::speaker::SpeakerRepo;
use mpo_db::task::TaskRepo;
use mpo_dispatch::{DispatchContext, Dispatcher};
use mpo_ingest::{IngestionCoordinator, NullMediaProbe};
use mpo_index::MemoryIndex;
use mpo_broker::{InMemoryBroker, QueueConcurrency};
use mpo_monitor::config::MonitorConfig;
use mpo_monitor::logging::LoggingManager;
use mpo_monitor::MonitorService;
use mpo_notify::NotifyBus;
use mpo_pipelines::url_ingest::HttpDownloader;
use mpo_pipelines::{NullSecretsProvider, NullSummarizer, UnconfiguredDiarizer, UnconfiguredTranscriber};
use mpo_reaper::{ReaperScheduler, SweepThresholds};
use mpo_storage::fs_store::FsObjectStore;
use mpo_storage::RetryingObjectStore;
use mpo_tlm::TaskLifecycleManager;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "mpo", about = "OpenTranscribe Media Processing Orchestrator")]
struct Cli {
    /// Path to an optional TOML config file, layered over built-in
    /// defaults and overridden in turn by `MPO_`-prefixed env vars.
    #[arg(long, env = "MPO_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MpoConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let logging = LoggingManager::new(config.logging.clone())
        .await
        .map_err(anyhow::Error::msg)?;
    logging.start().await.map_err(anyhow::Error::msg)?;

    info!("🔧 starting opentranscribe-mpo");

    let config_handle = ConfigHandle::new(config.clone());

    let db_pool = DatabasePool::new(&config.database).await?;
    migrations::run_migrations(db_pool.pool()).await?;

    let media_files = MediaFileRepo::new(db_pool.pool().clone());
    let tasks = TaskRepo::new(db_pool.pool().clone());
    let segments = SegmentRepo::new(db_pool.pool().clone());
    let speakers = SpeakerRepo::new(db_pool.pool().clone());
    let analytics = AnalyticsRepo::new(db_pool.pool().clone());

    let fs_store = Arc::new(FsObjectStore::new(config.storage.root_dir.clone()));
    let store: Arc<dyn mpo_storage::ObjectStore> = Arc::new(RetryingObjectStore::new(fs_store));

    let index: Arc<dyn mpo_index::IndexGateway> = Arc::new(MemoryIndex::new());

    let broker_limits = QueueConcurrency {
        gpu: config.broker.gpu_queue_concurrency as usize,
        cpu: config.broker.cpu_queue_concurrency as usize,
        nlp: config.broker.nlp_queue_concurrency as usize,
        download: config.broker.download_queue_concurrency as usize,
        utility: config.broker.utility_queue_concurrency as usize,
    };
    let broker: Arc<dyn mpo_broker::Broker> = Arc::new(InMemoryBroker::new(broker_limits));

    let notify_bus = Arc::new(NotifyBus::new(
        config.notify.replay_buffer_size,
        Duration::from_secs(60),
    ));
    let publisher: Arc<dyn mpo_common::EventPublisher> = notify_bus.clone();

    let retry_backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(300), 5);
    let tlm = Arc::new(TaskLifecycleManager::new(
        media_files.clone(),
        tasks.clone(),
        broker.clone(),
        publisher.clone(),
        retry_backoff,
    ));

    let probe: Arc<dyn mpo_ingest::probe::MediaProbe> = Arc::new(NullMediaProbe);
    let ingest = Arc::new(IngestionCoordinator::new(
        media_files.clone(),
        tasks.clone(),
        store.clone(),
        broker.clone(),
        probe,
    ));

    let dispatch_ctx = DispatchContext {
        media_files: media_files.clone(),
        tasks: tasks.clone(),
        segments,
        speakers,
        analytics,
        store: store.clone(),
        index: index.clone(),
        broker: broker.clone(),
        tlm: tlm.clone(),
        ingest,
        transcriber: Arc::new(UnconfiguredTranscriber),
        diarizer: Arc::new(UnconfiguredDiarizer),
        summarizer: Arc::new(NullSummarizer),
        secrets: Arc::new(NullSecretsProvider),
        downloader: Arc::new(HttpDownloader::new()),
        config: config_handle.clone(),
    };
    let _dispatcher = Dispatcher::spawn(dispatch_ctx);
    info!("✅ job dispatcher worker loops started");

    let reaper_thresholds = SweepThresholds {
        stale_pending_after_secs: config.recovery.stale_pending_after_secs,
        stall_deadline_secs: config.recovery.stall_deadline_secs,
        cancel_deadline_secs: config.recovery.cancel_deadline_secs,
    };
    let mut reaper = ReaperScheduler::new(
        media_files,
        tlm,
        publisher,
        reaper_thresholds,
        Duration::from_secs(config.recovery.sweep_interval_secs),
    );
    reaper.start();

    let notify_router = mpo_notify::router(notify_bus);
    let notify_listener = tokio::net::TcpListener::bind(&config.notify.bind_addr).await?;
    info!("✅ notification bus listening on {}", config.notify.bind_addr);
    let notify_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(notify_listener, notify_router).await {
            warn!("⚠️ notification bus server exited: {e}");
        }
    });

    let mut monitor_config = MonitorConfig::default();
    monitor_config.metrics.prometheus_endpoint = config.metrics.bind_addr.clone();
    let mut monitor_service = MonitorService::new(monitor_config).await.map_err(anyhow::Error::msg)?;
    monitor_service.start().await.map_err(anyhow::Error::msg)?;
    info!("✅ monitoring endpoints started");

    tokio::signal::ctrl_c().await?;
    info!("🛑 shutdown signal received");

    reaper.stop().await;
    notify_server.abort();
    monitor_service.stop().await.map_err(anyhow::Error::msg)?;

    Ok(())
}
