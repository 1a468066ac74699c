//! The closed set of client commands.
//!
//! Every wire command is one variant of [`Command`], so dispatch is a
//! compile-time-exhaustive match rather than a string-keyed handler map.
//! The public / authenticated partition lives here too; the two name
//! sets are disjoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{MarketPair, RequestId};
use crate::order::OrderTicket;
use crate::session::SessionKey;

/// One validated, typed client command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // ---- public (usable while anonymous) ----
    Register {
        username: String,
        email: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
        session_key: SessionKey,
    },
    FetchOrderbook {
        market: MarketPair,
    },
    FetchTrades {
        market: MarketPair,
    },
    TickerInfo {
        market: MarketPair,
    },
    // ---- authenticated ----
    SayHello {
        message: String,
    },
    PlaceOrder {
        ticket: OrderTicket,
    },
    FetchAccounts,
    GetBitcoinDepositAddress,
    WithdrawBitcoin {
        address: String,
        amount: Decimal,
    },
}

impl Command {
    /// The wire name of this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Login { .. } => "login",
            Self::FetchOrderbook { .. } => "fetch_orderbook",
            Self::FetchTrades { .. } => "fetch_trades",
            Self::TickerInfo { .. } => "ticker_info",
            Self::SayHello { .. } => "say_hello",
            Self::PlaceOrder { .. } => "place_order",
            Self::FetchAccounts => "fetch_accounts",
            Self::GetBitcoinDepositAddress => "get_bitcoin_deposit_address",
            Self::WithdrawBitcoin { .. } => "withdraw_bitcoin",
        }
    }

    /// Whether this command requires an authenticated session.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        match self {
            Self::Register { .. }
            | Self::Login { .. }
            | Self::FetchOrderbook { .. }
            | Self::FetchTrades { .. }
            | Self::TickerInfo { .. } => false,
            Self::SayHello { .. }
            | Self::PlaceOrder { .. }
            | Self::FetchAccounts
            | Self::GetBitcoinDepositAddress
            | Self::WithdrawBitcoin { .. } => true,
        }
    }
}

/// One inbound request: a client-chosen correlation id plus its command.
/// Produced by the wire decoder, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub command: Command,
}
