//! Inbound dispatch.
//!
//! Re-exports the router so hosts can feed raw channel messages straight into
//! an endpoint.

pub mod router;

pub use router::Router;
