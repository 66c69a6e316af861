//! coven relay runtime.
//!
//! This crate wires the stream codec, routing policy, registry, and worker
//! pool into a multi-client TCP relay (`Server`) and its outbound
//! counterpart (`Client`). It is consumed by the `coven-relay` binary and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod node;
pub mod obs;
pub mod policy;
pub mod server;
pub mod transport;

pub use client::Client;
pub use config::{ClientOptions, RelayConfig, ServerOptions};
pub use node::{MessageListener, Node, NodeCore, SharedListener};
pub use server::Server;
pub use transport::{Codec, FramedCodec};
