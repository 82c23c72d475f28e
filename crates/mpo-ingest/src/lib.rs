//! Ingestion Coordinator (C5): the prepare->upload handshake, content-hash
//! dedup, and URL ingest intake. Owns the one write path into `mpo-db`
//! and `mpo-storage` that runs before a file has an active task, so it
//! never has to go through `mpo-tlm`'s CAS transitions.

pub mod error;
pub mod hashing;
pub mod prepare;
pub mod probe;
pub mod upload;
pub mod url_ingest;

use std::sync::Arc;

use mpo_broker::Broker;
use mpo_db::media_file::MediaFileRepo;
use mpo_db::task::TaskRepo;
use mpo_storage::ObjectStore;

use crate::probe::MediaProbe;

pub use error::{IngestError, Result};
pub use prepare::{PrepareRequest, PrepareResponse};
pub use probe::{NullMediaProbe, ProbedMetadata};
pub use url_ingest::{UrlIngestRequest, UrlIngestResponse};

/// Entry point for everything spec §4.5 assigns to the Ingestion
/// Coordinator. Constructed once at process start and shared behind an
/// `Arc` by whatever API facade accepts client requests.
pub struct IngestionCoordinator {
    pub(crate) media_files: MediaFileRepo,
    pub(crate) tasks: TaskRepo,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) broker: Arc<dyn Broker>,
    pub(crate) probe: Arc<dyn MediaProbe>,
}

impl IngestionCoordinator {
    pub fn new(
        media_files: MediaFileRepo,
        tasks: TaskRepo,
        store: Arc<dyn ObjectStore>,
        broker: Arc<dyn Broker>,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            media_files,
            tasks,
            store,
            broker,
            probe,
        }
    }
}
