//! Artifact Store Gateway (C1): content-addressed, hierarchical-key
//! object storage for uploaded media and derived artifacts (thumbnails,
//! waveforms).

pub mod error;
pub mod fs_store;
pub mod retrying;
pub mod store;

pub use error::{Result, StorageError};
pub use fs_store::FsObjectStore;
pub use retrying::RetryingObjectStore;
pub use store::{ByteRange, ObjectReader, ObjectStore};
