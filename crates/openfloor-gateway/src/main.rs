//! Gateway service entry point.
//!
//! Serves the venue's WebSocket protocol with the bundled in-memory
//! collaborators. Configuration comes from the environment:
//!
//! - `OPENFLOOR_LISTEN` — listen address (default `127.0.0.1:8765`)
//! - `OPENFLOOR_SETTLE_MS` — settlement period in ms (default `1000`)

use std::env;
use std::sync::Arc;

use openfloor_engine::{DerivedBitcoinApi, MemoryEngine, Sha256PasswordHasher};
use openfloor_gateway::GatewayServer;
use openfloor_types::{GatewayConfig, OpenfloorError, Result, constants};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config_from_env()?;
    info!(
        version = constants::VERSION,
        addr = %config.listen_addr,
        settle_ms = config.settlement_period_ms,
        "starting {}",
        constants::GATEWAY_NAME
    );

    let server = GatewayServer::new(
        config,
        Arc::new(MemoryEngine::new()),
        Arc::new(DerivedBitcoinApi::new()),
        Arc::new(Sha256PasswordHasher::new()),
    );
    server.run().await
}

fn config_from_env() -> Result<GatewayConfig> {
    let mut config = GatewayConfig::default();

    if let Ok(listen) = env::var("OPENFLOOR_LISTEN") {
        config.listen_addr = listen
            .parse()
            .map_err(|_| OpenfloorError::Configuration(format!("bad OPENFLOOR_LISTEN: {listen}")))?;
    }
    if let Ok(period) = env::var("OPENFLOOR_SETTLE_MS") {
        config.settlement_period_ms = period.parse().map_err(|_| {
            OpenfloorError::Configuration(format!("bad OPENFLOOR_SETTLE_MS: {period}"))
        })?;
    }

    Ok(config)
}
