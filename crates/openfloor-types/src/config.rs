//! Configuration types for the OpenFloor gateway.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for a gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to listen on for client WebSocket connections.
    pub listen_addr: SocketAddr,
    /// Settlement loop period in milliseconds.
    pub settlement_period_ms: u64,
    /// Per-connection outbound queue capacity. A connection whose queue
    /// is full has broadcasts dropped rather than blocking the hub.
    pub outbound_queue: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                constants::DEFAULT_LISTEN_PORT,
            ),
            settlement_period_ms: constants::DEFAULT_SETTLEMENT_PERIOD_MS,
            outbound_queue: constants::DEFAULT_OUTBOUND_QUEUE,
        }
    }
}
