//! Routing policy construction.
//!
//! Turns the `routing` config section into the `RoutingPolicy` the server
//! consults before every delivery.

pub mod allowlist;

use std::sync::Arc;

use coven_core::error::Result;
use coven_core::{AllowAll, DenyAll, Payload, RoutingPolicy};

use crate::config::{RoutingMode, RoutingSection};

pub use allowlist::{AddressClass, AllowlistPolicy, RouteRule};

pub fn build<T: Payload>(section: &RoutingSection) -> Result<Arc<dyn RoutingPolicy<T>>> {
    Ok(match section.mode {
        RoutingMode::AllowAll => Arc::new(AllowAll),
        RoutingMode::DenyAll => Arc::new(DenyAll),
        RoutingMode::Allowlist => Arc::new(AllowlistPolicy::compile(&section.allow)?),
    })
}
