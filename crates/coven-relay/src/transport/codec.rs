//! Stream codec: moves whole envelopes across a byte stream.
//!
//! `Codec` is the pluggable capability the relay consumes. `FramedCodec` is
//! the reference implementation: a `u32` big-endian length prefix followed by
//! one frame produced by a `WireFormat`.

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use coven_core::error::{CovenError, Result};
use coven_core::protocol::{Envelope, WireFormat};

/// Default upper bound for a single frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Reads/writes one envelope at a time. Fails on malformed data or a closed stream.
#[async_trait]
pub trait Codec<T>: Send + Sync {
    async fn read_envelope(&self, reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<Envelope<T>>;

    async fn write_envelope(
        &self,
        envelope: &Envelope<T>,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()>;
}

pub struct FramedCodec<F> {
    format: F,
    max_frame_bytes: usize,
}

impl<F> FramedCodec<F> {
    pub fn new(format: F) -> Self {
        Self::with_max_frame_bytes(format, DEFAULT_MAX_FRAME_BYTES)
    }

    pub fn with_max_frame_bytes(format: F, max_frame_bytes: usize) -> Self {
        Self { format, max_frame_bytes: max_frame_bytes.max(1) }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.max_frame_bytes {
            return Err(CovenError::FrameTooLarge { len, max: self.max_frame_bytes });
        }
        Ok(())
    }
}

/// Read the `u32` length prefix. Only an EOF before its first byte is a clean close.
async fn read_prefix(reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u32> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..]).await? {
            0 if filled == 0 => return Err(CovenError::ConnectionClosed),
            0 => {
                return Err(CovenError::BadFrame(format!(
                    "stream ended inside the length prefix ({filled} of 4 bytes)"
                )))
            }
            n => filled += n,
        }
    }
    Ok(u32::from_be_bytes(prefix))
}

#[async_trait]
impl<T, F> Codec<T> for FramedCodec<F>
where
    T: Send + Sync + 'static,
    F: WireFormat<T>,
{
    async fn read_envelope(&self, reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<Envelope<T>> {
        let len = read_prefix(&mut *reader).await? as usize;
        self.check_len(len)?;

        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CovenError::BadFrame(format!("stream ended inside a {len} byte frame"))
            } else {
                e.into()
            }
        })?;

        self.format.decode(Bytes::from(frame))
    }

    async fn write_envelope(
        &self,
        envelope: &Envelope<T>,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let frame = self.format.encode(envelope)?;
        self.check_len(frame.len())?;
        let len = u32::try_from(frame.len())
            .map_err(|_| CovenError::FrameTooLarge { len: frame.len(), max: u32::MAX as usize })?;

        // prefix + body in one write so concurrent writers never interleave halves
        let mut out = BytesMut::with_capacity(4 + frame.len());
        out.put_u32(len);
        out.put_slice(&frame);
        writer.write_all(&out).await?;
        writer.flush().await?;
        Ok(())
    }
}
