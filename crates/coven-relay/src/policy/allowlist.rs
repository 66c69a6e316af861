//! Class-based route allowlist.
//!
//! Rules have the form `"<from>:<to>"` where each side is an address class
//! (`server`, `peer`, `broadcast`) or `*`. Concrete peer ids are assigned at
//! connect time, so rules match classes rather than ids.

use coven_core::error::{CovenError, Result};
use coven_core::protocol::{Address, AddressKind, Envelope};
use coven_core::RoutingPolicy;

/// Coarse address category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Server,
    Peer,
    Broadcast,
}

impl AddressClass {
    pub fn of(addr: &Address) -> Self {
        match addr.kind() {
            AddressKind::Server => AddressClass::Server,
            AddressKind::Broadcast => AddressClass::Broadcast,
            AddressKind::Me | AddressKind::Peer(_) => AddressClass::Peer,
        }
    }

    fn parse(s: &str) -> Option<Option<Self>> {
        match s {
            "*" => Some(None),
            "server" => Some(Some(AddressClass::Server)),
            "peer" => Some(Some(AddressClass::Peer)),
            "broadcast" => Some(Some(AddressClass::Broadcast)),
            _ => None,
        }
    }
}

/// Compiled rule. `None` on either side is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub from: Option<AddressClass>,
    pub to: Option<AddressClass>,
}

impl RouteRule {
    fn matches(&self, from: AddressClass, to: AddressClass) -> bool {
        self.from.map_or(true, |c| c == from) && self.to.map_or(true, |c| c == to)
    }
}

pub fn compile_rules(raw: &[String]) -> Result<Vec<RouteRule>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let (from, to) = s.split_once(':').ok_or_else(|| {
            CovenError::Config(format!("invalid routing.allow entry: {s} (expected from:to)"))
        })?;
        let from = AddressClass::parse(from.trim()).ok_or_else(|| {
            CovenError::Config(format!("invalid routing.allow class: {from}"))
        })?;
        let to = AddressClass::parse(to.trim()).ok_or_else(|| {
            CovenError::Config(format!("invalid routing.allow class: {to}"))
        })?;
        out.push(RouteRule { from, to });
    }
    Ok(out)
}

/// Approves a route iff some rule matches. No rules means strict deny.
#[derive(Debug, Clone, Default)]
pub struct AllowlistPolicy {
    rules: Vec<RouteRule>,
}

impl AllowlistPolicy {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn compile(raw: &[String]) -> Result<Self> {
        Ok(Self::new(compile_rules(raw)?))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn allows(&self, from: &Address, to: &Address) -> bool {
        let (from, to) = (AddressClass::of(from), AddressClass::of(to));
        self.rules.iter().any(|r| r.matches(from, to))
    }
}

impl<T> RoutingPolicy<T> for AllowlistPolicy {
    fn is_valid_route(&self, envelope: &Envelope<T>) -> bool {
        self.allows(envelope.from(), envelope.to())
    }
}
