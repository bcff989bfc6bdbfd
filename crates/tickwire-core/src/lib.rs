//! tickwire core: channel-agnostic protocol primitives, values and errors.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! runtime and by anything that wants to speak the protocol. It carries no
//! scheduler or channel dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `IpcError`/`Result` so a host does not crash
//! on malformed input from another consumer of the channel.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod limits;
pub mod protocol;
pub mod value;

/// Shared result type.
pub use error::{ErrorKind, IpcError, Result};
pub use codec::{JsonCodec, PayloadCodec};
pub use value::{Failure, Value, FAILURE_SENTINEL_KEY};
