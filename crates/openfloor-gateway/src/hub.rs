//! Registry of live connections and broadcast fan-out.
//!
//! The hub is the single owner of the connection set. Connection tasks
//! only register and deregister; broadcast walks the current membership
//! and pushes onto each connection's bounded outbound queue. `try_send`
//! keeps delivery non-blocking: a full queue (slow client) or a closed
//! queue (connection tearing down mid-broadcast) is skipped, never an
//! error.

use std::collections::HashMap;
use std::sync::Mutex;

use openfloor_types::{BroadcastEvent, ConnectionId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Registry of live connections, keyed by connection id.
#[derive(Default)]
pub struct GatewayHub {
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl GatewayHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<String>>> {
        self.connections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a connection's outbound queue to the registry.
    pub fn register(&self, id: ConnectionId, outbound: mpsc::Sender<String>) {
        self.lock().insert(id, outbound);
        info!(conn = %id.short(), "connection registered");
    }

    /// Remove a connection from the registry. Safe to call twice.
    pub fn deregister(&self, id: &ConnectionId) {
        if self.lock().remove(id).is_some() {
            info!(conn = %id.short(), "connection deregistered");
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `event` to every live connection. Serialized once;
    /// per-connection delivery failures are skipped.
    pub fn broadcast(&self, event: &BroadcastEvent) {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "failed to serialize broadcast event");
                return;
            }
        };

        let connections = self.lock();
        for (id, outbound) in connections.iter() {
            if outbound.try_send(text.clone()).is_err() {
                debug!(conn = %id.short(), event = %event.event, "skipped slow or closing connection");
            }
        }
    }
}
