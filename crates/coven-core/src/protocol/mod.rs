//! Addressing protocol and wire formats.
//!
//! - `Address` / `Header` / `Envelope`: immutable addressing wrapper around a payload.
//! - `WireFormat`: pure bytes <-> envelope mapping. Framing on a stream is the
//!   relay's job; a wire format only ever sees one complete frame.
//!
//! Decoders are panic-free: malformed input is reported as `CovenError`
//! instead of panicking or indexing raw buffers.

pub mod address;
pub mod binary;
pub mod envelope;
pub mod header;
pub mod json;

use bytes::Bytes;

use crate::error::Result;

pub use address::{Address, AddressKind, BROADCAST, ME, SERVER};
pub use binary::BinaryFormat;
pub use envelope::Envelope;
pub use header::Header;
pub use json::JsonFormat;

/// Encodes/decodes one whole envelope to/from one frame.
pub trait WireFormat<T>: Send + Sync {
    fn encode(&self, envelope: &Envelope<T>) -> Result<Bytes>;
    fn decode(&self, frame: Bytes) -> Result<Envelope<T>>;
}
