//! The command schema table.
//!
//! One static entry per wire command: its auth partition, its ordered
//! field specs, and the constructor that turns validated parameters into
//! the typed [`Command`] variant. Field count must match the schema's
//! arity exactly; one failing field invalidates the whole command.

use openfloor_types::{BitcoinApi, Command, MarketPair, OrderSide, OrderTicket, SessionKey};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::field::FieldSpec;

type BuildFn = fn(&[Value]) -> Option<Command>;

/// Schema for one wire command.
pub struct CommandSchema {
    pub name: &'static str,
    pub requires_auth: bool,
    pub fields: &'static [FieldSpec],
    build: BuildFn,
}

impl CommandSchema {
    /// Validate `params` positionally and construct the typed command.
    /// `None` means the parameters did not satisfy the schema.
    #[must_use]
    pub fn validate_and_build(&self, params: &[Value], bitcoin: &dyn BitcoinApi) -> Option<Command> {
        if params.len() != self.fields.len() {
            return None;
        }
        if !self
            .fields
            .iter()
            .zip(params)
            .all(|(spec, value)| spec.check(value, bitcoin))
        {
            return None;
        }
        (self.build)(params)
    }
}

/// Look up a command schema by wire name across both partitions.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static CommandSchema> {
    SCHEMAS.iter().find(|schema| schema.name == name)
}

/// All command schemas. Public and authenticated names are disjoint.
pub static SCHEMAS: &[CommandSchema] = &[
    // ---- public ----
    CommandSchema {
        name: "register",
        requires_auth: false,
        fields: &[FieldSpec::Str, FieldSpec::Email, FieldSpec::Str],
        build: build_register,
    },
    CommandSchema {
        name: "login",
        requires_auth: false,
        fields: &[FieldSpec::Str, FieldSpec::Str, FieldSpec::PublicKey],
        build: build_login,
    },
    CommandSchema {
        name: "fetch_orderbook",
        requires_auth: false,
        fields: &[FieldSpec::CurrencyCode, FieldSpec::CurrencyCode],
        build: build_fetch_orderbook,
    },
    CommandSchema {
        name: "fetch_trades",
        requires_auth: false,
        fields: &[FieldSpec::CurrencyCode, FieldSpec::CurrencyCode],
        build: build_fetch_trades,
    },
    CommandSchema {
        name: "ticker_info",
        requires_auth: false,
        fields: &[FieldSpec::CurrencyCode, FieldSpec::CurrencyCode],
        build: build_ticker_info,
    },
    // ---- authenticated ----
    CommandSchema {
        name: "say_hello",
        requires_auth: true,
        fields: &[FieldSpec::Str],
        build: build_say_hello,
    },
    CommandSchema {
        name: "place_order",
        requires_auth: true,
        fields: &[
            FieldSpec::CurrencyCode,
            FieldSpec::CurrencyCode,
            FieldSpec::OrderValue,
            FieldSpec::OrderValue,
            FieldSpec::OrderType,
        ],
        build: build_place_order,
    },
    CommandSchema {
        name: "fetch_accounts",
        requires_auth: true,
        fields: &[],
        build: build_fetch_accounts,
    },
    CommandSchema {
        name: "get_bitcoin_deposit_address",
        requires_auth: true,
        fields: &[],
        build: build_get_bitcoin_deposit_address,
    },
    CommandSchema {
        name: "withdraw_bitcoin",
        requires_auth: true,
        fields: &[FieldSpec::BitcoinAddress, FieldSpec::Amount],
        build: build_withdraw_bitcoin,
    },
];

// ---------------------------------------------------------------------------
// Constructors — parameters are already schema-validated here
// ---------------------------------------------------------------------------

fn str_at(params: &[Value], index: usize) -> Option<&str> {
    params.get(index)?.as_str()
}

fn decimal_at(params: &[Value], index: usize) -> Option<Decimal> {
    str_at(params, index)?.parse().ok()
}

fn market_at(params: &[Value]) -> Option<MarketPair> {
    Some(MarketPair::new(str_at(params, 0)?, str_at(params, 1)?))
}

fn build_register(params: &[Value]) -> Option<Command> {
    Some(Command::Register {
        username: str_at(params, 0)?.to_string(),
        email: str_at(params, 1)?.to_string(),
        password: str_at(params, 2)?.to_string(),
    })
}

fn build_fetch_orderbook(params: &[Value]) -> Option<Command> {
    Some(Command::FetchOrderbook {
        market: market_at(params)?,
    })
}

fn build_fetch_trades(params: &[Value]) -> Option<Command> {
    Some(Command::FetchTrades {
        market: market_at(params)?,
    })
}

fn build_ticker_info(params: &[Value]) -> Option<Command> {
    Some(Command::TickerInfo {
        market: market_at(params)?,
    })
}

fn build_say_hello(params: &[Value]) -> Option<Command> {
    Some(Command::SayHello {
        message: str_at(params, 0)?.to_string(),
    })
}

fn build_fetch_accounts(_params: &[Value]) -> Option<Command> {
    Some(Command::FetchAccounts)
}

fn build_get_bitcoin_deposit_address(_params: &[Value]) -> Option<Command> {
    Some(Command::GetBitcoinDepositAddress)
}

fn build_withdraw_bitcoin(params: &[Value]) -> Option<Command> {
    Some(Command::WithdrawBitcoin {
        address: str_at(params, 0)?.to_string(),
        amount: decimal_at(params, 1)?,
    })
}

fn build_login(params: &[Value]) -> Option<Command> {
    Some(Command::Login {
        username: str_at(params, 0)?.to_string(),
        password: str_at(params, 1)?.to_string(),
        session_key: SessionKey::from_hex(str_at(params, 2)?)?,
    })
}

fn build_place_order(params: &[Value]) -> Option<Command> {
    Some(Command::PlaceOrder {
        ticket: OrderTicket {
            market: market_at(params)?,
            price: decimal_at(params, 2)?,
            amount: decimal_at(params, 3)?,
            side: OrderSide::from_tag(str_at(params, 4)?)?,
        },
    })
}
