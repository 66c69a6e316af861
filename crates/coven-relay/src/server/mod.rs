//! Relay server: accepts peers and relays envelopes between them.
//!
//! - `registry`: live peers, indexed by connection handle and by id
//! - `pool`: fixed-size worker pool, the only admission control
//! - `handler`: accept loop + one handler task per connection
//! - `relay`: routing-gated broadcast / server-directed / unicast delivery
//! - `identity`: sender substitution and target resolution

mod handler;
pub mod identity;
pub mod peer;
pub mod pool;
pub mod registry;
mod relay;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use coven_core::error::{CovenError, Result};
use coven_core::protocol::Address;
use coven_core::{Payload, PeerId, RoutingPolicy};

use crate::config::ServerOptions;
use crate::node::{Node, NodeCore, SharedListener};
use crate::obs::RelayMetrics;
use crate::transport::Codec;

pub use identity::IdentityMode;
pub use peer::{ConnHandle, Peer};
pub use pool::WorkerPool;
pub use registry::PeerRegistry;

use relay::Shared;

/// Handles that only exist while the server is running.
#[derive(Default)]
struct Lifecycle {
    acceptor: Option<JoinHandle<()>>,
    pool: Option<Arc<WorkerPool>>,
    local_addr: Option<SocketAddr>,
}

/// Multi-client relay server. Cheap to clone; clones share one server.
pub struct Server<T> {
    shared: Arc<Shared<T>>,
    opts: Arc<ServerOptions>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl<T> Clone for Server<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            opts: Arc::clone(&self.opts),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<T: Payload> Server<T> {
    pub fn new(
        opts: ServerOptions,
        codec: Arc<dyn Codec<T>>,
        policy: Arc<dyn RoutingPolicy<T>>,
    ) -> Result<Self> {
        opts.validate()?;

        let write_timeout = match opts.write_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let node = NodeCore::new(codec, Arc::new(RelayMetrics::new()));
        let shared = Shared::new(
            node,
            policy,
            opts.identity,
            opts.include_sender_in_broadcasts,
            write_timeout,
        );

        Ok(Self {
            shared: Arc::new(shared),
            opts: Arc::new(opts),
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
        })
    }

    /// Bind the listening socket and start accepting peers.
    pub async fn start(&self) -> Result<()> {
        let mut lc = self.lifecycle.lock().await;
        if self.shared.running.load(Ordering::Acquire) {
            return Err(CovenError::AlreadyRunning);
        }

        let listener = TcpListener::bind((self.opts.host.as_str(), self.opts.port)).await?;
        let local_addr = listener.local_addr()?;
        let pool = Arc::new(WorkerPool::new(self.opts.max_clients));

        // set before the acceptor runs; it exits as soon as it sees false
        self.shared.running.store(true, Ordering::Release);
        let acceptor = tokio::spawn(handler::accept_loop(
            Arc::clone(&self.shared),
            listener,
            Arc::clone(&pool),
        ));

        lc.acceptor = Some(acceptor);
        lc.pool = Some(pool);
        lc.local_addr = Some(local_addr);

        tracing::info!(%local_addr, max_clients = self.opts.max_clients, "relay server started");
        Ok(())
    }

    /// Stop accepting, interrupt every handler, and close every connection.
    pub async fn stop(&self) -> Result<()> {
        let mut lc = self.lifecycle.lock().await;
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(CovenError::NotRunning);
        }

        self.shared.running.store(false, Ordering::Release);
        if let Some(acceptor) = lc.acceptor.take() {
            acceptor.abort();
            // the listening socket is released once the aborted task is dropped
            let _ = acceptor.await;
        }
        if let Some(pool) = lc.pool.take() {
            pool.shutdown_now();
        }
        lc.local_addr = None;

        let peers = self.shared.registry.drain();
        self.shared.metrics().peers_dropped(peers.len());
        for peer in &peers {
            peer.close().await;
        }

        tracing::info!(closed = peers.len(), "relay server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Bound address while running (resolves port 0 binds).
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.lock().await.local_addr
    }

    pub fn options(&self) -> &ServerOptions {
        &self.opts
    }

    pub fn max_clients(&self) -> usize {
        self.opts.max_clients
    }

    pub fn include_sender_in_broadcasts(&self) -> bool {
        self.shared.include_sender.load(Ordering::Relaxed)
    }

    pub fn set_include_sender_in_broadcasts(&self, include: bool) {
        self.shared.include_sender.store(include, Ordering::Relaxed);
    }

    pub fn routing_policy(&self) -> Arc<dyn RoutingPolicy<T>> {
        Arc::clone(&self.shared.policy)
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.shared.registry
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.shared.registry.ids()
    }

    pub fn peer_count(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn metrics(&self) -> &RelayMetrics {
        self.shared.metrics()
    }
}

#[async_trait]
impl<T: Payload> Node<T> for Server<T> {
    fn id(&self) -> PeerId {
        self.shared.node.id()
    }

    /// Send `payload` to every registered peer as `{from: "s", to: <peer>}`.
    async fn broadcast(&self, payload: T) -> Result<()> {
        self.shared.broadcast_from_server(payload).await;
        Ok(())
    }

    /// Send `payload` to one peer as `{from: "s", to}`. Unknown targets and
    /// denied routes are logged no-ops; a failed write is returned.
    async fn send(&self, to: &str, payload: T) -> Result<()> {
        let to = Address::parse(to)?;
        self.shared.send_from_server(to, payload).await
    }

    fn listener(&self) -> Option<SharedListener<T>> {
        self.shared.node.listener()
    }

    fn set_listener(&self, listener: Option<SharedListener<T>>) {
        self.shared.node.set_listener(listener);
    }
}
