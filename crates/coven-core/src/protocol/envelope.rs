use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::address::Address;
use super::header::Header;

/// Header plus payload. Immutable once built; `with_*` return new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<T> {
    header: Header,
    payload: T,
}

impl<T> Envelope<T> {
    pub fn new(header: Header, payload: T) -> Self {
        Self { header, payload }
    }

    /// Build from raw address strings; fails if either is blank.
    pub fn of(from: &str, to: &str, payload: T) -> Result<Self> {
        Ok(Self::new(Header::of(from, to)?, payload))
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn from(&self) -> &Address {
        self.header.from()
    }

    pub fn to(&self) -> &Address {
        self.header.to()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn into_parts(self) -> (Header, T) {
        (self.header, self.payload)
    }

    pub fn is_broadcast(&self) -> bool {
        self.header.to().is_broadcast()
    }

    pub fn was_sent_to_server(&self) -> bool {
        self.header.to().is_server()
    }
}

impl<T: Clone> Envelope<T> {
    pub fn with_from(&self, from: Address) -> Self {
        Self::new(self.header.with_from(from), self.payload.clone())
    }

    pub fn with_to(&self, to: Address) -> Self {
        Self::new(self.header.with_to(to), self.payload.clone())
    }
}
