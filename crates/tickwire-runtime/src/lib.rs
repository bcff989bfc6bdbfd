//! tickwire runtime library entry.
//!
//! This crate wires the listener registry, router, invoke correlator, stream
//! jobs and tick scheduler into an `Ipc` endpoint, plus an in-process
//! loopback host that drives endpoints for the demo binary and for
//! integration tests.

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod host;
pub mod ids;
pub mod invoke;
pub mod ipc;
pub mod outbound;
pub mod registry;
pub mod scheduler;
mod sync;

pub use channel::{Channel, LoopbackBus};
pub use host::LoopbackHost;
pub use invoke::{InvokeHandle, InvokeOptions};
pub use ipc::Ipc;
pub use outbound::{SendHandle, SendOptions};
pub use registry::Listener;
pub use scheduler::{Job, JobStep, RunId, TickScheduler};
