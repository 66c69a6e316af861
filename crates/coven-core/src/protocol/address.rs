use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CovenError, Result};
use crate::id::PeerId;

/// Every currently registered peer.
pub const BROADCAST: &str = "*";
/// The relay server itself.
pub const SERVER: &str = "s";
/// Reserved self token. Not interpreted by the relay; resolves to no peer.
pub const ME: &str = "m";

/// A non-blank addressing token (`from` / `to`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(Arc<str>);

/// What an address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind<'a> {
    Broadcast,
    Server,
    Me,
    Peer(&'a str),
}

impl Address {
    /// Validate and wrap. Blank strings stand in for an absent field and are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(CovenError::InvalidAddress("address must not be blank".into()));
        }
        Ok(Self(Arc::from(s)))
    }

    pub fn broadcast() -> Self {
        Self(Arc::from(BROADCAST))
    }

    pub fn server() -> Self {
        Self(Arc::from(SERVER))
    }

    pub fn me() -> Self {
        Self(Arc::from(ME))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> AddressKind<'_> {
        match &*self.0 {
            BROADCAST => AddressKind::Broadcast,
            SERVER => AddressKind::Server,
            ME => AddressKind::Me,
            other => AddressKind::Peer(other),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self.kind(), AddressKind::Broadcast)
    }

    pub fn is_server(&self) -> bool {
        matches!(self.kind(), AddressKind::Server)
    }

    /// The peer id this address names, if it is one.
    pub fn peer_id(&self) -> Option<PeerId> {
        match self.kind() {
            AddressKind::Peer(s) => PeerId::parse(s),
            _ => None,
        }
    }
}

impl From<PeerId> for Address {
    fn from(id: PeerId) -> Self {
        Self(Arc::from(id.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = CovenError;

    fn try_from(s: String) -> Result<Self> {
        Address::parse(&s)
    }
}

impl TryFrom<&str> for Address {
    type Error = CovenError;

    fn try_from(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0.to_string()
    }
}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Address {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}
