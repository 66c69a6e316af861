//! Sender identity substitution and target resolution.
//!
//! The `from` a peer declares is never trusted: every inbound envelope is
//! re-stamped with the identity the server assigned to its connection before
//! anything else looks at it.

use coven_core::error::{CovenError, Result};
use coven_core::protocol::{Address, AddressKind, Envelope};
use coven_core::PeerId;

pub use crate::config::IdentityMode;

use super::peer::Peer;

impl IdentityMode {
    /// The identity the relay attributes to traffic from `peer`.
    pub fn identify(self, peer: &Peer) -> Result<Address> {
        match self {
            IdentityMode::Connection => Ok(peer.address().clone()),
            IdentityMode::Authenticated => Err(CovenError::Unsupported("authenticated identity")),
        }
    }

    /// Replace the declared sender with the connection's true identity.
    pub fn stamp_sender<T>(self, peer: &Peer, envelope: Envelope<T>) -> Result<Envelope<T>> {
        let from = self.identify(peer)?;
        let (header, payload) = envelope.into_parts();
        Ok(Envelope::new(header.with_from(from), payload))
    }

    /// Map a `to` address onto a registered id. Only connection ids resolve.
    pub fn resolve_target(self, to: &Address) -> Result<PeerId> {
        match (self, to.kind()) {
            (IdentityMode::Connection, AddressKind::Peer(_)) => to
                .peer_id()
                .ok_or(CovenError::Unsupported("login lookup")),
            (IdentityMode::Authenticated, _) => Err(CovenError::Unsupported("login lookup")),
            (_, _) => Err(CovenError::InvalidAddress(format!("{to} does not name a peer"))),
        }
    }
}
