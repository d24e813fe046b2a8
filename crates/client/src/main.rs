//! RLAI bridge binary.
//!
//! Drives the built-in arena against a remote policy server, one report per
//! turn and one action per report.
//!
//! # Examples
//!
//! ```bash
//! # Line protocol against a local policy server
//! cargo run -p bridge-client
//!
//! # HTTP endpoints, five episodes, debug logs to a file
//! BRIDGE_TRANSPORT=http BRIDGE_EPISODES=5 BRIDGE_LOG_DIR=/tmp/bridge \
//!     RUST_LOG=bridge=debug cargo run -p bridge-client
//! ```

use anyhow::Result;
use bridge_client::{Bridge, BridgeConfig, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = BridgeConfig::from_env();

    // Keep the guard alive so the file writer flushes on exit
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting RLAI bridge");
    tracing::info!("Transport: {} ({})", config.transport, config.endpoint());
    tracing::info!("Episodes: {}", config.episodes);

    let summaries = Bridge::new(config).run().await?;

    let clean = summaries
        .iter()
        .filter(|summary| summary.exit.is_clean())
        .count();
    tracing::info!(
        "Bridge finished: {} episodes, {} ended by the simulation",
        summaries.len(),
        clean
    );
    Ok(())
}
