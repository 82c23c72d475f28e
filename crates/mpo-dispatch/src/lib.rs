//! Job Dispatcher (C6): per-queue worker loops that pull jobs off the
//! broker, resolve them to stage pipeline calls, and drive the Task
//! Lifecycle Manager's transitions around each invocation.

pub mod context;
pub mod error;
pub mod handlers;
pub mod materialize;
pub mod worker;

pub use context::DispatchContext;
pub use error::{DispatchError, Result};
pub use worker::{Dispatcher, Outcome, MAX_NON_OWNING_REDELIVERIES};
