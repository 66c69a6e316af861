//! Accept loop and per-connection handler.
//!
//! Lifecycle of one connection:
//! - accept -> fresh id -> registered in both views
//! - handler queued on the worker pool (waits if every worker is busy)
//! - decode -> stamp sender -> dispatch, until the stream fails or closes
//! - close -> unregister

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

use coven_core::error::CovenError;
use coven_core::{Payload, PeerId};

use crate::transport::{split_stream, BoxedReader};

use super::peer::Peer;
use super::pool::WorkerPool;
use super::relay::Shared;

/// Pause after a failed `accept` so a persistent error (e.g. EMFILE) cannot spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub(crate) async fn accept_loop<T: Payload>(
    shared: Arc<Shared<T>>,
    listener: TcpListener,
    pool: Arc<WorkerPool>,
) {
    while shared.running.load(Ordering::Acquire) {
        match listener.accept().await {
            Ok((stream, remote)) => admit(&shared, &pool, stream, remote),
            Err(e) => {
                tracing::warn!(error = %e, "error accepting new peer connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Register the connection, then queue its handler. Registration comes first so
/// every running handler can already resolve this peer.
fn admit<T: Payload>(
    shared: &Arc<Shared<T>>,
    pool: &WorkerPool,
    stream: TcpStream,
    remote: SocketAddr,
) {
    let (reader, writer) = split_stream(stream);
    let peer = Arc::new(Peer::new(PeerId::new(), shared.next_handle(), remote, writer));

    shared.registry.register(Arc::clone(&peer));
    shared.metrics().peer_connected();
    tracing::info!(peer = %peer.id(), handle = %peer.handle(), %remote, busy = pool.busy(), "peer connected");

    let span = tracing::info_span!("peer", id = %peer.id(), %remote);
    pool.submit(serve_peer(Arc::clone(shared), peer, reader).instrument(span));
}

/// Handler task: owns the peer's input stream for the lifetime of the connection.
pub(crate) async fn serve_peer<T: Payload>(shared: Arc<Shared<T>>, peer: Arc<Peer>, mut reader: BoxedReader) {
    let reason: CovenError = loop {
        let inbound = match shared.node.codec().read_envelope(&mut *reader).await {
            Ok(env) => env,
            Err(e) => break e,
        };
        let stamped = match shared.identity.stamp_sender(&peer, inbound) {
            Ok(env) => env,
            Err(e) => break e,
        };
        shared.dispatch(&peer, stamped).await;
    };

    if reason.is_disconnect() {
        tracing::info!("peer disconnected");
    } else {
        tracing::warn!(code = reason.code(), class = reason.class().as_str(), error = %reason, "error in peer connection");
    }

    peer.close().await;
    if shared.registry.unregister(peer.handle()).is_some() {
        shared.metrics().peer_disconnected();
    }
}
