//! coven relay server binary.
//!
//! - Config: `coven-relay [path]` (default `coven.yaml`), strict YAML
//! - Payloads: arbitrary JSON values, length-prefixed JSON frames
//! - Logs every server-directed message; runs until Ctrl-C

use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use coven_core::protocol::{Envelope, JsonFormat};
use coven_core::Result;
use coven_relay::{config, policy, FramedCodec, Node, Server};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "coven.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let codec = Arc::new(FramedCodec::with_max_frame_bytes(
        JsonFormat::<Value>::new(),
        cfg.server.max_frame_bytes,
    ));
    let routing = policy::build::<Value>(&cfg.routing)?;
    let server = Server::new(cfg.server.clone(), codec, routing)?;

    server.set_listener(Some(Arc::new(|env: Envelope<Value>| -> Result<()> {
        tracing::info!(from = %env.from(), payload = %env.payload(), "message for server");
        Ok(())
    })));

    server.start().await?;
    if let Some(addr) = server.local_addr().await {
        tracing::info!(%addr, config = %path, "coven-relay listening");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to wait for ctrl-c");
    }

    server.stop().await?;
    tracing::info!(metrics = %server.metrics().render(), "final metrics");
    Ok(())
}
