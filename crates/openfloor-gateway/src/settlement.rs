//! Periodic settlement: drain matched trades, close pending deposits.
//!
//! The logic ([`Settler`]) is separate from its trigger
//! ([`run_polling`]) so a push-based trigger can replace the poll
//! without touching settlement itself. Each tick runs the two drains
//! sequentially; they are independent of each other and of request
//! handling.

use std::sync::Arc;
use std::time::Duration;

use openfloor_types::{BroadcastEvent, EventKind, ExchangeEngine, Result};
use tracing::{error, info};

use crate::hub::GatewayHub;

/// What one settlement tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// `trade` events broadcast this tick.
    pub trades: usize,
    /// Deposit events credited and closed this tick.
    pub deposits: usize,
}

/// Executes the two settlement drains against the engine and the hub.
pub struct Settler {
    engine: Arc<dyn ExchangeEngine>,
    hub: Arc<GatewayHub>,
}

impl Settler {
    #[must_use]
    pub fn new(engine: Arc<dyn ExchangeEngine>, hub: Arc<GatewayHub>) -> Self {
        Self { engine, hub }
    }

    /// Run one full tick: match drain, then deposit settlement.
    pub async fn tick(&self) -> Result<TickReport> {
        let trades = self.drain_matches().await?;
        let deposits = self.settle_deposits().await?;
        Ok(TickReport { trades, deposits })
    }

    /// Invoke the engine's match step until it reports no match,
    /// broadcasting each trade before attempting the next. Drains the
    /// whole backlog, not just one pair.
    async fn drain_matches(&self) -> Result<usize> {
        let mut count = 0;
        while let Some(trade) = self.engine.match_one_order().await? {
            self.hub
                .broadcast(&BroadcastEvent::new(EventKind::Trade, trade));
            count += 1;
        }
        Ok(count)
    }

    /// Credit and close all open deposits in one engine transaction.
    async fn settle_deposits(&self) -> Result<usize> {
        let settled = self.engine.settle_open_deposits().await?;
        for deposit in &settled {
            info!(
                event = %deposit.event_id,
                account = %deposit.account_id,
                amount = %deposit.amount,
                "processed deposit event"
            );
        }
        Ok(settled.len())
    }
}

/// Drive `settler` on a fixed period. A failed tick is logged and the
/// loop continues; settlement never takes the process down.
pub async fn run_polling(settler: Settler, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if let Err(err) = settler.tick().await {
            error!(%err, "settlement tick failed");
        }
    }
}
