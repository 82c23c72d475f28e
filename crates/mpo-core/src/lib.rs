//! Shared kernel for the Media Processing Orchestrator.
//!
//! Every other `mpo-*` crate depends on this one for its error type,
//! configuration loading, the small set of cross-cutting traits
//! (`Service`, `Monitorable`, `ProgressSink`), retry/backoff math, and
//! the content-addressing hash used for upload dedup.

pub mod config;
pub mod error;
pub mod hash;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{MpoError, Result};
pub use hash::ContentHash;
