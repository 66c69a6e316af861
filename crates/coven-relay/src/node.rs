//! Shared participant contract for `Server` and `Client`.
//!
//! `Node` is the capability set both variants expose; `NodeCore` is the small
//! holder they each embed for identity, codec, and listener state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use coven_core::error::{CovenError, Result};
use coven_core::protocol::Envelope;
use coven_core::{Payload, PeerId};

use crate::obs::metrics::RelayMetrics;
use crate::transport::Codec;

/// Receives envelopes on the task that decoded them. Must not block.
pub trait MessageListener<T>: Send + Sync {
    fn on_message(&self, envelope: Envelope<T>) -> Result<()>;
}

impl<T, F> MessageListener<T> for F
where
    F: Fn(Envelope<T>) -> Result<()> + Send + Sync,
{
    fn on_message(&self, envelope: Envelope<T>) -> Result<()> {
        self(envelope)
    }
}

pub type SharedListener<T> = Arc<dyn MessageListener<T>>;

#[async_trait]
pub trait Node<T: Payload>: Send + Sync {
    fn id(&self) -> PeerId;

    /// Deliver `payload` to every peer reachable through this node.
    async fn broadcast(&self, payload: T) -> Result<()>;

    /// Deliver `payload` to one address.
    async fn send(&self, to: &str, payload: T) -> Result<()>;

    fn listener(&self) -> Option<SharedListener<T>>;

    fn set_listener(&self, listener: Option<SharedListener<T>>);
}

pub struct NodeCore<T> {
    id: PeerId,
    codec: Arc<dyn Codec<T>>,
    listener: RwLock<Option<SharedListener<T>>>,
    metrics: Arc<RelayMetrics>,
}

impl<T: Payload> NodeCore<T> {
    pub fn new(codec: Arc<dyn Codec<T>>, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            id: PeerId::new(),
            codec,
            listener: RwLock::new(None),
            metrics,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub(crate) fn codec(&self) -> &dyn Codec<T> {
        self.codec.as_ref()
    }

    pub(crate) fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn listener(&self) -> Option<SharedListener<T>> {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_listener(&self, listener: Option<SharedListener<T>>) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = listener;
    }

    /// Hand `envelope` to the listener, if any. Listener errors and panics stop here.
    pub fn notify(&self, envelope: Envelope<T>) {
        let Some(listener) = self.listener() else { return; };

        let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_message(envelope)))
            .unwrap_or_else(|_| Err(CovenError::Listener("listener panicked".into())));

        if let Err(e) = outcome {
            self.metrics.listener_failure();
            tracing::warn!(node = %self.id, code = e.code(), error = %e, "error while notifying listener");
        }
    }
}
