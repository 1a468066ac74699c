//! Order request types accepted by the gateway.
//!
//! The gateway never holds an order book — a validated [`OrderTicket`]
//! is handed to the external engine as one atomic operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::MarketPair;

/// Which side of the book an order is on. Wire tags are exactly
/// `"Buy"` / `"Sell"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Parse the wire tag. Case-sensitive.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Buy" => Some(Self::Buy),
            "Sell" => Some(Self::Sell),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// A fully validated limit-order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub market: MarketPair,
    pub price: Decimal,
    pub amount: Decimal,
    pub side: OrderSide,
}

impl OrderTicket {
    /// The (currency, amount) the engine deducts when accepting this order:
    /// a buy locks `price × amount` of the quote currency, a sell locks
    /// `amount` of the base currency.
    #[must_use]
    pub fn deduction(&self) -> (&str, Decimal) {
        match self.side {
            OrderSide::Buy => (&self.market.quote, self.price * self.amount),
            OrderSide::Sell => (&self.market.base, self.amount),
        }
    }
}
