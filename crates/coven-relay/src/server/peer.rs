use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use coven_core::error::{CovenError, Result};
use coven_core::protocol::{Address, Envelope};
use coven_core::PeerId;

use crate::transport::{BoxedWriter, Codec};

/// Registry key for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnHandle(u64);

impl ConnHandle {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registered connection: id, handle, and the shared output stream.
///
/// The input stream is not stored here; it is owned by the single handler
/// task serving this peer.
pub struct Peer {
    id: PeerId,
    address: Address,
    handle: ConnHandle,
    remote: SocketAddr,
    writer: Mutex<Option<BoxedWriter>>,
}

impl Peer {
    pub fn new(id: PeerId, handle: ConnHandle, remote: SocketAddr, writer: BoxedWriter) -> Self {
        Self {
            id,
            address: Address::from(id),
            handle,
            remote,
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// The id as an envelope address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn handle(&self) -> ConnHandle {
        self.handle
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Encode `envelope` onto this peer's stream. Writers to one peer are serialized.
    pub async fn write<T>(
        &self,
        codec: &dyn Codec<T>,
        envelope: &Envelope<T>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(CovenError::ConnectionClosed)?;
        let Some(d) = timeout else {
            return codec.write_envelope(envelope, &mut **writer).await;
        };
        let outcome = tokio::time::timeout(d, codec.write_envelope(envelope, &mut **writer)).await;
        match outcome {
            Ok(res) => res,
            Err(_) => {
                // a frame may be half written; the stream can no longer be framed
                *guard = None;
                Err(CovenError::Timeout)
            }
        }
    }

    /// Close the output stream. Errors are swallowed; later writes fail with `ConnectionClosed`.
    pub async fn close(&self) {
        let taken = self.writer.lock().await.take();
        if let Some(mut w) = taken {
            let _ = w.shutdown().await;
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.writer.lock().await.is_none()
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Peer {}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("remote", &self.remote)
            .finish()
    }
}
