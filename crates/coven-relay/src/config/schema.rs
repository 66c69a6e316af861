use serde::Deserialize;
use coven_core::error::{CovenError, Result};

use crate::transport::DEFAULT_MAX_FRAME_BYTES;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerOptions,

    #[serde(default)]
    pub routing: RoutingSection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CovenError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.routing.validate()?;

        Ok(())
    }
}

/// How the server decides who sent an inbound envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Sender is the connection's registered id.
    #[default]
    Connection,
    /// Sender is an authenticated login. Not supported yet.
    Authenticated,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerOptions {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker pool size: the number of connections served at once.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,

    #[serde(default = "default_include_sender")]
    pub include_sender_in_broadcasts: bool,

    /// Per-recipient write timeout. 0 disables it.
    #[serde(default)]
    pub write_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default)]
    pub identity: IdentityMode,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_clients: default_max_clients(),
            include_sender_in_broadcasts: default_include_sender(),
            write_timeout_ms: 0,
            max_frame_bytes: default_max_frame_bytes(),
            identity: IdentityMode::default(),
        }
    }
}

impl ServerOptions {
    pub fn with_port(port: u16) -> Self {
        Self { port, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CovenError::Config("server.host must not be blank".into()));
        }
        if self.port == 0 {
            return Err(CovenError::Config("server.port must be between 1 and 65535".into()));
        }
        if self.max_clients == 0 {
            return Err(CovenError::Config("server.max_clients must be greater than 0".into()));
        }
        if self.write_timeout_ms > 600_000 {
            return Err(CovenError::Config(
                "server.write_timeout_ms must be at most 600000".into(),
            ));
        }
        if !(1..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(CovenError::Config(
                "server.max_frame_bytes must be between 1 and 16777216".into(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    7070
}
fn default_max_clients() -> usize {
    100
}
fn default_include_sender() -> bool {
    true
}
fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    #[default]
    AllowAll,
    DenyAll,
    Allowlist,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingSection {
    #[serde(default)]
    pub mode: RoutingMode,

    /// `"<from>:<to>"` class rules, e.g. `"peer:server"` or `"server:*"`.
    #[serde(default)]
    pub allow: Vec<String>,
}

impl RoutingSection {
    pub fn validate(&self) -> Result<()> {
        if self.mode != RoutingMode::Allowlist && !self.allow.is_empty() {
            return Err(CovenError::Config(
                "routing.allow only applies to mode: allowlist".into(),
            ));
        }
        crate::policy::allowlist::compile_rules(&self.allow)?;
        Ok(())
    }
}

/// Outbound client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientOptions {
    pub host: String,
    pub port: u16,
}

impl ClientOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CovenError::Config(format!("invalid host: {:?}", self.host)));
        }
        if self.port == 0 {
            return Err(CovenError::Config(format!("invalid port number: {}", self.port)));
        }
        Ok(())
    }
}
