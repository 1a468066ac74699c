//! Gateway server assembly: accept loop plus the settlement task.

use std::sync::Arc;
use std::time::Duration;

use openfloor_types::{
    BitcoinApi, ExchangeEngine, GatewayConfig, PasswordHasher, Result,
};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::connection::ConnectionActor;
use crate::dispatch::Dispatcher;
use crate::hub::GatewayHub;
use crate::settlement::{Settler, run_polling};

/// Wires collaborators, hub, dispatcher, and settlement together and
/// serves client connections.
pub struct GatewayServer {
    config: GatewayConfig,
    engine: Arc<dyn ExchangeEngine>,
    bitcoin: Arc<dyn BitcoinApi>,
    hub: Arc<GatewayHub>,
    dispatcher: Arc<Dispatcher>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        engine: Arc<dyn ExchangeEngine>,
        bitcoin: Arc<dyn BitcoinApi>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let hub = Arc::new(GatewayHub::new());
        let dispatcher = Arc::new(Dispatcher::new(
            engine.clone(),
            bitcoin.clone(),
            hasher,
            hub.clone(),
        ));
        Self {
            config,
            engine,
            bitcoin,
            hub,
            dispatcher,
        }
    }

    /// The live connection registry (exposed for tests and metrics).
    #[must_use]
    pub fn hub(&self) -> Arc<GatewayHub> {
        self.hub.clone()
    }

    /// Bind the configured listen address and serve forever.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener (tests bind port 0 and read
    /// the ephemeral address back before calling this).
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "gateway listening");

        let settler = Settler::new(self.engine.clone(), self.hub.clone());
        let period = Duration::from_millis(self.config.settlement_period_ms);
        tokio::spawn(run_polling(settler, period));

        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(%peer, "accepted connection");
            let actor = ConnectionActor::new(
                self.dispatcher.clone(),
                self.hub.clone(),
                self.bitcoin.clone(),
                self.config.outbound_queue,
            );
            tokio::spawn(actor.run(stream));
        }
    }
}
