//! Top-level facade crate for coven.
//!
//! Re-exports the protocol core and the relay runtime so users can depend on a single crate.

pub mod core {
    pub use coven_core::*;
}

pub mod relay {
    pub use coven_relay::*;
}
