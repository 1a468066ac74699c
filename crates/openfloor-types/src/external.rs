//! Contracts for the external collaborators the gateway drives.
//!
//! The gateway owns no business logic: account storage, order matching,
//! address derivation, and password hashing all live behind these traits.
//! Implementations may fail any call; recognized business-rule failures
//! carry a wire code (see [`OpenfloorError::wire_code`]), everything else
//! is treated as an infrastructure fault.
//!
//! No timeout is applied to collaborator calls by the gateway — deadline
//! policy is an integration decision.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{OpenfloorError, Result};
use crate::ids::{AccountEventId, AccountId, MarketPair, UserId};
use crate::order::OrderTicket;
use crate::session::SessionKey;

/// Stored credentials for one user, as returned by
/// [`ExchangeEngine::authenticate_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub user_id: UserId,
    pub password_hash: String,
}

/// One settled deposit, as reported by
/// [`ExchangeEngine::settle_open_deposits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub event_id: AccountEventId,
    pub account_id: AccountId,
    pub amount: Decimal,
}

/// The persistence / matching engine. Every method is one atomic
/// operation on the engine's side.
#[async_trait]
pub trait ExchangeEngine: Send + Sync {
    /// Create a user. Fails with [`OpenfloorError::DuplicateUsername`] if
    /// the username is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId>;

    /// Look up stored credentials by username. Fails with
    /// [`OpenfloorError::NonexistentUsername`] if unknown.
    async fn authenticate_login(&self, username: &str) -> Result<LoginCredentials>;

    /// Record one password login attempt, successful or not.
    async fn record_login_attempt(&self, successful: bool, user_id: Option<UserId>) -> Result<()>;

    /// Durably register a session key for a login event. Fails with
    /// [`OpenfloorError::NonuniqueSessionKey`] if that exact key was ever
    /// registered before.
    async fn register_session_key(&self, user_id: UserId, key: &SessionKey) -> Result<()>;

    /// Place a validated order, deducting the escrowed funds. Fails with
    /// [`OpenfloorError::InsufficientBalance`] when the deduction would
    /// overdraw the account.
    async fn place_order(&self, user_id: UserId, ticket: &OrderTicket) -> Result<()>;

    /// Match at most one pair of crossing orders. Returns the trade data
    /// to broadcast, or `None` when nothing matched.
    async fn match_one_order(&self) -> Result<Option<Value>>;

    /// Open orders for a market.
    async fn query_orderbook(&self, market: &MarketPair) -> Result<Value>;

    /// Recent trades for a market.
    async fn query_trades(&self, market: &MarketPair) -> Result<Value>;

    /// Ticker summary for a market.
    async fn query_ticker_info(&self, market: &MarketPair) -> Result<Value>;

    /// All currency balances for a user.
    async fn query_accounts(&self, user_id: UserId) -> Result<Value>;

    /// The user's current bitcoin derivation chain index.
    async fn current_chain_index(&self, user_id: UserId) -> Result<u32>;

    /// Credit and close every open deposit event, all-or-nothing within
    /// one engine transaction, and return the events that were closed.
    /// Already-closed events are never returned again.
    async fn settle_open_deposits(&self) -> Result<Vec<DepositEvent>>;

    /// File a bitcoin withdrawal request. Fails with
    /// [`OpenfloorError::InsufficientBalance`] when the balance cannot
    /// cover `amount`.
    async fn request_withdrawal(
        &self,
        user_id: UserId,
        address: &str,
        amount: Decimal,
    ) -> Result<()>;
}

/// Bitcoin address service: validity checks for the wire validator and
/// deterministic deposit-address derivation.
pub trait BitcoinApi: Send + Sync {
    fn is_valid_address(&self, address: &str) -> bool;

    fn derive_deposit_address(&self, user_id: UserId, chain_index: u32) -> String;
}

/// Password hashing service.
pub trait PasswordHasher: Send + Sync {
    /// Hash a cleartext password for storage.
    fn hash(&self, password: &str) -> String;

    /// Check a cleartext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
