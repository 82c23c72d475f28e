//! Recovery Reaper (C10): the periodic reconciliation loop that keeps
//! `mpo_db`'s view of the world honest when a worker vanishes without
//! writing a terminal state. Owns the three sweeps from spec §4.10
//! ([`sweep`]), the `tokio::time::interval` loop driving them
//! ([`scheduler`]), and the safe-delete path ([`delete`]) that every
//! deletion request -- reaper-driven or operator-driven -- goes
//! through.

pub mod delete;
pub mod error;
pub mod scheduler;
pub mod sweep;

pub use delete::{safe_delete, DeleteContext};
pub use error::{ReaperError, Result};
pub use scheduler::ReaperScheduler;
pub use sweep::{run_all, SweepReport, SweepThresholds};
