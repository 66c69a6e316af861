//! coven core: transport-agnostic protocol primitives, routing contract, and errors.
//!
//! This crate defines the addressing protocol (ids, addresses, headers,
//! envelopes), the wire formats that map envelopes to bytes, and the routing
//! policy contract shared by the relay runtime and by integrators. It carries
//! no async runtime dependency so it can be reused by any transport.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input
//! surfaces as `CovenError` so a hostile peer cannot crash the relay.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod id;
pub mod protocol;
pub mod routing;

pub use error::{CovenError, ErrorClass, Result};
pub use id::PeerId;
pub use protocol::{Address, AddressKind, Envelope, Header, WireFormat};
pub use routing::{AllowAll, DenyAll, RoutingPolicy};

/// Bound shared by every payload type the relay can carry.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Payload for T {}
