//! Routing authorization contract.
//!
//! The relay consults a `RoutingPolicy` before every single delivery attempt.
//! Implementations must be pure and non-blocking: a denial drops exactly that
//! delivery and is never retried.

use crate::protocol::Envelope;

pub trait RoutingPolicy<T>: Send + Sync {
    fn is_valid_route(&self, envelope: &Envelope<T>) -> bool;
}

/// Approves every route.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl<T> RoutingPolicy<T> for AllowAll {
    fn is_valid_route(&self, _envelope: &Envelope<T>) -> bool {
        true
    }
}

/// Denies every route (relay fully disabled).
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl<T> RoutingPolicy<T> for DenyAll {
    fn is_valid_route(&self, _envelope: &Envelope<T>) -> bool {
        false
    }
}
