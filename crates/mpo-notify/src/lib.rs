//! Notification Bus (C9): per-user broadcast fan-out with a bounded
//! replay buffer, served over a server-side WebSocket upgrade handler.
//! `mpo-tlm` publishes through the `EventPublisher` trait; it never
//! depends on this crate directly.

pub mod bus;
pub mod error;
pub mod ws;

pub use bus::NotifyBus;
pub use error::{NotifyError, Result};
pub use ws::router;
