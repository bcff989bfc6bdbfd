//! Outbound string channel.
//!
//! A channel moves `(event_id, message)` pairs to every party listening on
//! it. It knows nothing about envelopes; it only carries strings and may
//! refuse ones it can't carry.

pub mod loopback;

pub use loopback::{Delivery, LoopbackBus};

use tickwire_core::error::Result;

pub trait Channel: Send + Sync {
    fn transmit(&self, event_id: &str, message: &str) -> Result<()>;
}
