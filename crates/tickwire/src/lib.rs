//! Top-level facade crate for tickwire.
//!
//! Re-exports the protocol core and the runtime so users can depend on a single crate.

pub mod core {
    pub use tickwire_core::*;
}

pub mod runtime {
    pub use tickwire_runtime::*;
}
