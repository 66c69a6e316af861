use std::fmt;

use uuid::Uuid;

const HYPHENATED_LEN: usize = 36;

/// Node / connection identifier. Assigned once, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the hyphenated textual form (either case). Braced, urn and simple
    /// forms are not peer ids.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != HYPHENATED_LEN {
            return None;
        }
        Uuid::try_parse(s).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}
