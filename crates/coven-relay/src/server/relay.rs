//! Relay engine: routing checks, fan-out, and unicast resolution.
//!
//! Every delivery is gated by the routing policy on its own. A denial, an
//! unknown target, or a failed write affects only that one delivery.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;

use coven_core::error::Result;
use coven_core::protocol::{Address, AddressKind, Envelope, Header};
use coven_core::{Payload, RoutingPolicy};

use crate::node::NodeCore;
use crate::obs::metrics::path;
use crate::obs::RelayMetrics;

use super::identity::IdentityMode;
use super::peer::{ConnHandle, Peer};
use super::registry::PeerRegistry;

/// State shared by the acceptor, every handler, and the `Server` facade.
pub(crate) struct Shared<T> {
    pub(crate) node: NodeCore<T>,
    pub(crate) registry: PeerRegistry,
    pub(crate) policy: Arc<dyn RoutingPolicy<T>>,
    pub(crate) identity: IdentityMode,
    pub(crate) include_sender: AtomicBool,
    pub(crate) write_timeout: Option<Duration>,
    pub(crate) running: AtomicBool,
    next_handle: AtomicU64,
}

impl<T: Payload> Shared<T> {
    pub(crate) fn new(
        node: NodeCore<T>,
        policy: Arc<dyn RoutingPolicy<T>>,
        identity: IdentityMode,
        include_sender: bool,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            node,
            registry: PeerRegistry::new(),
            policy,
            identity,
            include_sender: AtomicBool::new(include_sender),
            write_timeout,
            running: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
        }
    }

    pub(crate) fn metrics(&self) -> &RelayMetrics {
        self.node.metrics()
    }

    pub(crate) fn next_handle(&self) -> ConnHandle {
        ConnHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Ask the routing policy about one delivery; denials are logged and counted.
    fn approve(&self, envelope: &Envelope<T>, path: &'static str) -> bool {
        if self.policy.is_valid_route(envelope) {
            return true;
        }
        self.metrics().route_denied(path);
        tracing::debug!(path, from = %envelope.from(), to = %envelope.to(), "route denied");
        false
    }

    async fn deliver(&self, peer: &Peer, envelope: &Envelope<T>, path: &'static str) -> Result<()> {
        let res = peer
            .write(self.node.codec(), envelope, self.write_timeout)
            .await;
        self.metrics().delivery(path, res.is_ok());
        res
    }

    /// Write each (peer, envelope) pair concurrently. One failure never affects the others.
    async fn fan_out(&self, deliveries: Vec<(Arc<Peer>, Envelope<T>)>, path: &'static str) {
        let mut futs = FuturesUnordered::new();
        for (peer, envelope) in deliveries {
            futs.push(async move {
                if let Err(e) = self.deliver(&peer, &envelope, path).await {
                    tracing::warn!(
                        path,
                        peer = %peer.id(),
                        code = e.code(),
                        error = %e,
                        "error sending message to peer"
                    );
                }
            });
        }
        while futs.next().await.is_some() {}
    }

    fn notify_listener(&self, envelope: Envelope<T>) {
        if self.approve(&envelope, path::NOTIFY) {
            self.node.notify(envelope);
        }
    }

    /// Route one inbound envelope whose sender has already been stamped.
    pub(crate) async fn dispatch(&self, sender: &Peer, envelope: Envelope<T>) {
        match envelope.to().kind() {
            AddressKind::Broadcast => self.relay_broadcast(sender, envelope).await,
            AddressKind::Server => self.notify_listener(envelope),
            AddressKind::Me | AddressKind::Peer(_) => self.relay_unicast(envelope).await,
        }
    }

    async fn relay_broadcast(&self, sender: &Peer, envelope: Envelope<T>) {
        // the hosting application sees one copy, before any peer does
        self.notify_listener(envelope.with_to(Address::server()));

        let include_sender = self.include_sender.load(Ordering::Relaxed);
        let deliveries = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|p| include_sender || p.handle() != sender.handle())
            .map(|p| {
                let copy = envelope.with_to(p.address().clone());
                (p, copy)
            })
            .filter(|(_, copy)| self.approve(copy, path::BROADCAST))
            .collect();

        self.fan_out(deliveries, path::BROADCAST).await;
    }

    async fn relay_unicast(&self, envelope: Envelope<T>) {
        if !self.approve(&envelope, path::UNICAST) {
            return;
        }
        let Some(target) = self.lookup(envelope.to()) else { return; };
        let envelope = readdress(envelope, &target);
        if let Err(e) = self.deliver(&target, &envelope, path::UNICAST).await {
            tracing::warn!(peer = %target.id(), code = e.code(), error = %e, "error sending message to peer");
        }
    }

    /// Resolve a `to` address against the by-id view. Misses are logged and counted.
    fn lookup(&self, to: &Address) -> Option<Arc<Peer>> {
        let found = match self.identity.resolve_target(to) {
            Ok(id) => self.registry.resolve(&id),
            Err(e) => {
                tracing::debug!(%to, error = %e, "error identifying peer");
                None
            }
        };
        if found.is_none() {
            self.metrics().unresolved_target();
            tracing::debug!(%to, "no registered peer for target; dropped");
        }
        found
    }

    /// `{from: "s", to}`: application-initiated unicast.
    pub(crate) async fn send_from_server(&self, to: Address, payload: T) -> Result<()> {
        let envelope = Envelope::new(Header::new(Address::server(), to), payload);
        if !self.approve(&envelope, path::SERVER_SEND) {
            return Ok(());
        }
        match self.lookup(envelope.to()) {
            Some(target) => {
                let envelope = readdress(envelope, &target);
                self.deliver(&target, &envelope, path::SERVER_SEND).await
            }
            None => Ok(()),
        }
    }

    /// `{from: "s", to: <each peer>}`: application-initiated fan-out.
    pub(crate) async fn broadcast_from_server(&self, payload: T) {
        let deliveries = self
            .registry
            .snapshot()
            .into_iter()
            .map(|p| {
                let to = p.address().clone();
                (p, Envelope::new(Header::new(Address::server(), to), payload.clone()))
            })
            .filter(|(_, envelope)| self.approve(envelope, path::SERVER_BROADCAST))
            .collect();

        self.fan_out(deliveries, path::SERVER_BROADCAST).await;
    }
}

/// Rewrite `to` to the target's canonical id, so a recipient always sees its own id.
fn readdress<T>(envelope: Envelope<T>, target: &Peer) -> Envelope<T> {
    let (header, payload) = envelope.into_parts();
    Envelope::new(header.with_to(target.address().clone()), payload)
}
