//! Wire protocol modules.
//!
//! Every message on the channel is an envelope (`envelope`). Oversized
//! payloads travel as streams of fragments (`stream`); two-way calls prefix
//! their payload with a response listener id (`invoke`).
//!
//! All parsers are panic-free: malformed input is reported as
//! `IpcError::Protocol` instead of panicking or indexing raw strings.

pub mod envelope;
pub mod invoke;
pub mod stream;

pub use envelope::{Envelope, TypeFlag};
pub use invoke::InvokePayload;
pub use stream::{Reassembler, StreamChunk};
