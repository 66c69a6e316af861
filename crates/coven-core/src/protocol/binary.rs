//! Compact binary wire format for raw byte payloads (panic-free).
//!
//! Layout:
//! ```text
//! u8 version (=1) | u8 from_len | from | u8 to_len | to | payload...
//! ```
//! Parsing rules:
//! - Never index (`buf[0]`); use `Buf` with `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CovenError, Result};

use super::address::Address;
use super::envelope::Envelope;
use super::header::Header;
use super::WireFormat;

/// Current binary format version.
pub const BINARY_VERSION: u8 = 1;

/// Longest address the one-byte length prefix can carry.
pub const MAX_ADDRESS_LEN: usize = u8::MAX as usize;

#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryFormat;

impl BinaryFormat {
    pub fn new() -> Self {
        Self
    }
}

fn put_address(out: &mut BytesMut, addr: &Address) -> Result<()> {
    let raw = addr.as_str().as_bytes();
    let len = u8::try_from(raw.len()).map_err(|_| {
        CovenError::BadFrame(format!("address longer than {MAX_ADDRESS_LEN} bytes"))
    })?;
    out.put_u8(len);
    out.put_slice(raw);
    Ok(())
}

fn get_address(buf: &mut Bytes, field: &str) -> Result<Address> {
    if buf.remaining() < 1 {
        return Err(CovenError::BadFrame(format!("missing {field} length")));
    }
    let len = buf.get_u8() as usize;
    if buf.remaining() < len {
        return Err(CovenError::BadFrame(format!("{field} truncated")));
    }
    let raw = buf.copy_to_bytes(len);
    let s = std::str::from_utf8(&raw)
        .map_err(|e| CovenError::BadFrame(format!("{field} is not utf-8: {e}")))?;
    Address::parse(s)
}

impl WireFormat<Bytes> for BinaryFormat {
    fn encode(&self, envelope: &Envelope<Bytes>) -> Result<Bytes> {
        let header = envelope.header();
        let payload = envelope.payload();
        let mut out = BytesMut::with_capacity(
            3 + header.from().as_str().len() + header.to().as_str().len() + payload.len(),
        );
        out.put_u8(BINARY_VERSION);
        put_address(&mut out, header.from())?;
        put_address(&mut out, header.to())?;
        out.put_slice(payload);
        Ok(out.freeze())
    }

    fn decode(&self, mut buf: Bytes) -> Result<Envelope<Bytes>> {
        if buf.remaining() < 1 {
            return Err(CovenError::BadFrame("empty frame".into()));
        }
        if buf.get_u8() != BINARY_VERSION {
            return Err(CovenError::UnsupportedVersion);
        }

        let from = get_address(&mut buf, "from")?;
        let to = get_address(&mut buf, "to")?;

        // Remaining bytes are payload (zero-copy).
        let payload = buf.copy_to_bytes(buf.remaining());

        Ok(Envelope::new(Header::new(from, to), payload))
    }
}
