use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::address::Address;

/// Envelope header: who sent it and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    from: Address,
    to: Address,
}

impl Header {
    pub fn new(from: Address, to: Address) -> Self {
        Self { from, to }
    }

    /// Build from raw strings; fails if either side is blank.
    pub fn of(from: &str, to: &str) -> Result<Self> {
        Ok(Self::new(Address::parse(from)?, Address::parse(to)?))
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn with_from(&self, from: Address) -> Self {
        Self { from, to: self.to.clone() }
    }

    pub fn with_to(&self, to: Address) -> Self {
        Self { from: self.from.clone(), to }
    }
}
