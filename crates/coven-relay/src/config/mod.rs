//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;

use coven_core::error::{CovenError, Result};

pub use schema::{ClientOptions, IdentityMode, RelayConfig, RoutingMode, RoutingSection, ServerOptions};

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CovenError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| CovenError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
