//! Command dispatch: one exhaustive match from typed command to engine
//! call to response envelope.
//!
//! Engine failures that carry a wire code become error responses; every
//! other failure propagates as `Err`, which aborts only the requesting
//! connection. Placing an order and completing a login additionally fan
//! an event out to every live connection, distinct from the direct
//! response.

use std::sync::Arc;
use std::sync::LazyLock;

use openfloor_types::{
    BitcoinApi, BroadcastEvent, Command, EventKind, ExchangeEngine, OpenfloorError, OrderTicket,
    PasswordHasher, Request, Response, Result, Session, SessionKey,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::info;

use crate::hub::GatewayHub;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.]+$").expect("username regex compiles"));

/// Routes validated requests to the external collaborators.
pub struct Dispatcher {
    engine: Arc<dyn ExchangeEngine>,
    bitcoin: Arc<dyn BitcoinApi>,
    hasher: Arc<dyn PasswordHasher>,
    hub: Arc<GatewayHub>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        engine: Arc<dyn ExchangeEngine>,
        bitcoin: Arc<dyn BitcoinApi>,
        hasher: Arc<dyn PasswordHasher>,
        hub: Arc<GatewayHub>,
    ) -> Self {
        Self {
            engine,
            bitcoin,
            hasher,
            hub,
        }
    }

    /// Process one request against `session`.
    ///
    /// `Ok(response)` covers both success and recognized business-rule
    /// failures. `Err` is an unrecognized failure: the caller must stop
    /// processing this connection rather than mask it.
    pub async fn dispatch(&self, request: Request, session: &mut Session) -> Result<Response> {
        let id = request.id;
        match self.handle(request.command, session).await {
            Ok(result) => Ok(Response::ok(id, result)),
            Err(err) => match err.wire_code() {
                Some(code) => Ok(Response::err(id, code)),
                None => Err(err),
            },
        }
    }

    async fn handle(&self, command: Command, session: &mut Session) -> Result<Value> {
        match command {
            Command::Register {
                username,
                email,
                password,
            } => self.register(&username, &email, &password).await,
            Command::Login {
                username,
                password,
                session_key,
            } => self.login(session, &username, &password, session_key).await,
            Command::FetchOrderbook { market } => self.engine.query_orderbook(&market).await,
            Command::FetchTrades { market } => self.engine.query_trades(&market).await,
            Command::TickerInfo { market } => self.engine.query_ticker_info(&market).await,
            Command::SayHello { message } => {
                info!(message, "hello");
                Ok(Value::Null)
            }
            Command::PlaceOrder { ticket } => self.place_order(session, &ticket).await,
            Command::FetchAccounts => {
                let user_id = require_user(session)?;
                self.engine.query_accounts(user_id).await
            }
            Command::GetBitcoinDepositAddress => {
                let user_id = require_user(session)?;
                let chain_index = self.engine.current_chain_index(user_id).await?;
                let address = self.bitcoin.derive_deposit_address(user_id, chain_index);
                Ok(Value::String(address))
            }
            Command::WithdrawBitcoin { address, amount } => {
                let user_id = require_user(session)?;
                self.engine
                    .request_withdrawal(user_id, &address, amount)
                    .await?;
                Ok(Value::Null)
            }
        }
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<Value> {
        if !USERNAME_RE.is_match(username) {
            return Err(OpenfloorError::InvalidUsername {
                username: username.to_string(),
            });
        }
        let password_hash = self.hasher.hash(password);
        let user_id = self.engine.create_user(username, email, &password_hash).await?;
        info!(%user_id, username, "created account");
        Ok(Value::Null)
    }

    async fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        session_key: SessionKey,
    ) -> Result<Value> {
        let credentials = match self.engine.authenticate_login(username).await {
            Ok(credentials) => credentials,
            Err(err @ OpenfloorError::NonexistentUsername) => {
                self.engine.record_login_attempt(false, None).await?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if !self.hasher.verify(password, &credentials.password_hash) {
            self.engine
                .record_login_attempt(false, Some(credentials.user_id))
                .await?;
            return Err(OpenfloorError::WrongPassword);
        }

        self.engine
            .register_session_key(credentials.user_id, &session_key)
            .await?;
        self.engine
            .record_login_attempt(true, Some(credentials.user_id))
            .await?;

        session.authenticate(credentials.user_id, session_key);
        info!(user_id = %credentials.user_id, username, "login accepted");

        self.hub.broadcast(&BroadcastEvent::new(
            EventKind::Login,
            json!({ "username": username }),
        ));
        Ok(Value::Null)
    }

    async fn place_order(&self, session: &Session, ticket: &OrderTicket) -> Result<Value> {
        let user_id = require_user(session)?;
        self.engine.place_order(user_id, ticket).await?;

        self.hub.broadcast(&BroadcastEvent::new(
            EventKind::Order,
            json!({
                "amount": format_scaled(ticket.amount, 4),
                "price": format_scaled(ticket.price, 4),
                "order_type": ticket.side.as_tag(),
                "base": ticket.market.base,
                "quote": ticket.market.quote,
            }),
        ));
        Ok(Value::Null)
    }
}

/// The frame decoder only lets authenticated commands through on an
/// authenticated session; hitting this on an anonymous one is a state
/// inconsistency, not a business error.
fn require_user(session: &Session) -> Result<openfloor_types::UserId> {
    session.user_id().ok_or_else(|| {
        OpenfloorError::Internal("authenticated command on anonymous session".to_string())
    })
}

/// Render a decimal with exactly `scale` fractional digits
/// (`1.2` → `"1.2000"` at scale 4).
fn format_scaled(value: Decimal, scale: u32) -> String {
    let mut value = value.round_dp(scale);
    value.rescale(scale);
    value.to_string()
}
