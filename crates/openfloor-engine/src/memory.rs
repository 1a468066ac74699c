//! In-memory exchange engine.
//!
//! Accounts, orders, deposit events, and session keys live in one
//! mutex-guarded state block; every trait method takes and releases the
//! lock once, which is what makes each call atomic. Matching itself is
//! not implemented here — crossed trades are handed in through
//! [`MemoryEngine::push_matched_trade`] by whatever matcher runs
//! upstream, and [`match_one_order`](openfloor_types::ExchangeEngine::match_one_order)
//! drains them one at a time.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openfloor_types::{
    AccountEventId, AccountId, DepositEvent, ExchangeEngine, LoginCredentials, MarketPair,
    OpenfloorError, OrderTicket, Result, SessionKey, UserId,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, info};

struct UserRecord {
    user_id: UserId,
    #[allow(dead_code)]
    email: String,
    password_hash: String,
}

struct AccountRecord {
    user_id: UserId,
    currency: String,
    balance: Decimal,
}

struct OpenOrder {
    ticket: OrderTicket,
    created_at: DateTime<Utc>,
}

#[derive(PartialEq, Eq)]
enum DepositStatus {
    Open,
    Closed,
}

struct DepositRecord {
    event_id: AccountEventId,
    account_id: AccountId,
    amount: Decimal,
    status: DepositStatus,
}

#[derive(Default)]
struct State {
    users: HashMap<String, UserRecord>,
    session_keys: HashSet<SessionKey>,
    accounts: HashMap<AccountId, AccountRecord>,
    orders: Vec<OpenOrder>,
    matched: VecDeque<Value>,
    trades: Vec<Value>,
    deposits: Vec<DepositRecord>,
    chain_indices: HashMap<UserId, u32>,
    login_attempts: Vec<(bool, Option<UserId>)>,
}

impl State {
    fn account_mut(&mut self, user_id: UserId, currency: &str) -> Option<&mut AccountRecord> {
        self.accounts
            .values_mut()
            .find(|a| a.user_id == user_id && a.currency == currency)
    }

    fn account_id_or_create(&mut self, user_id: UserId, currency: &str) -> AccountId {
        if let Some((id, _)) = self
            .accounts
            .iter()
            .find(|(_, a)| a.user_id == user_id && a.currency == currency)
        {
            return *id;
        }
        let id = AccountId::new();
        self.accounts.insert(
            id,
            AccountRecord {
                user_id,
                currency: currency.to_string(),
                balance: Decimal::ZERO,
            },
        );
        id
    }
}

/// In-memory reference engine.
pub struct MemoryEngine {
    state: Mutex<State>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Credit a user's balance directly (funding outside the deposit
    /// event flow).
    pub fn credit(&self, user_id: UserId, currency: &str, amount: Decimal) {
        let mut state = self.lock();
        let id = state.account_id_or_create(user_id, currency);
        if let Some(account) = state.accounts.get_mut(&id) {
            account.balance += amount;
        }
    }

    /// Current balance for a (user, currency) account. Zero if the
    /// account does not exist.
    #[must_use]
    pub fn balance(&self, user_id: UserId, currency: &str) -> Decimal {
        let mut state = self.lock();
        state
            .account_mut(user_id, currency)
            .map_or(Decimal::ZERO, |a| a.balance)
    }

    /// Record an inbound on-chain deposit as an open account event. It
    /// stays pending until the settlement loop credits and closes it.
    pub fn open_deposit(&self, user_id: UserId, currency: &str, amount: Decimal) -> AccountEventId {
        let mut state = self.lock();
        let account_id = state.account_id_or_create(user_id, currency);
        let event_id = AccountEventId::new();
        state.deposits.push(DepositRecord {
            event_id,
            account_id,
            amount,
            status: DepositStatus::Open,
        });
        event_id
    }

    /// Number of deposit events still open.
    #[must_use]
    pub fn open_deposit_count(&self) -> usize {
        self.lock()
            .deposits
            .iter()
            .filter(|d| d.status == DepositStatus::Open)
            .count()
    }

    /// Hand over one crossed trade from the upstream matcher. Each queued
    /// entry is returned by exactly one `match_one_order` call.
    pub fn push_matched_trade(&self, trade: Value) {
        self.lock().matched.push_back(trade);
    }

    /// Number of password login attempts recorded.
    #[must_use]
    pub fn login_attempt_count(&self) -> usize {
        self.lock().login_attempts.len()
    }

    /// Look up a registered user's id by username.
    #[must_use]
    pub fn user_id(&self, username: &str) -> Option<UserId> {
        self.lock().users.get(username).map(|u| u.user_id)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeEngine for MemoryEngine {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId> {
        let mut state = self.lock();
        if state.users.contains_key(username) {
            return Err(OpenfloorError::DuplicateUsername {
                username: username.to_string(),
            });
        }
        let user_id = UserId::new();
        state.users.insert(
            username.to_string(),
            UserRecord {
                user_id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        info!(%user_id, username, "registered user");
        Ok(user_id)
    }

    async fn authenticate_login(&self, username: &str) -> Result<LoginCredentials> {
        let state = self.lock();
        let user = state
            .users
            .get(username)
            .ok_or(OpenfloorError::NonexistentUsername)?;
        Ok(LoginCredentials {
            user_id: user.user_id,
            password_hash: user.password_hash.clone(),
        })
    }

    async fn record_login_attempt(
        &self,
        successful: bool,
        user_id: Option<UserId>,
    ) -> Result<()> {
        self.lock().login_attempts.push((successful, user_id));
        Ok(())
    }

    async fn register_session_key(&self, user_id: UserId, key: &SessionKey) -> Result<()> {
        let mut state = self.lock();
        if !state.session_keys.insert(*key) {
            return Err(OpenfloorError::NonuniqueSessionKey);
        }
        debug!(%user_id, %key, "registered session key");
        Ok(())
    }

    async fn place_order(&self, user_id: UserId, ticket: &OrderTicket) -> Result<()> {
        let mut state = self.lock();
        let (currency, deduction) = ticket.deduction();
        let currency = currency.to_string();
        let account = state
            .account_mut(user_id, &currency)
            .filter(|a| a.balance >= deduction)
            .ok_or(OpenfloorError::InsufficientBalance)?;
        account.balance -= deduction;
        state.orders.push(OpenOrder {
            ticket: ticket.clone(),
            created_at: Utc::now(),
        });
        info!(
            %user_id,
            market = %ticket.market,
            side = %ticket.side,
            price = %ticket.price,
            amount = %ticket.amount,
            deducted = %deduction,
            %currency,
            "placed order"
        );
        Ok(())
    }

    async fn match_one_order(&self) -> Result<Option<Value>> {
        let mut state = self.lock();
        let Some(trade) = state.matched.pop_front() else {
            return Ok(None);
        };
        state.trades.push(trade.clone());
        Ok(Some(trade))
    }

    async fn query_orderbook(&self, market: &MarketPair) -> Result<Value> {
        let state = self.lock();
        let entries: Vec<Value> = state
            .orders
            .iter()
            .filter(|o| o.ticket.market == *market)
            .map(|o| {
                json!({
                    "price": o.ticket.price.to_string(),
                    "amount": o.ticket.amount.to_string(),
                    "order_type": o.ticket.side.as_tag(),
                    "timestamp": o.created_at.timestamp(),
                })
            })
            .collect();
        Ok(Value::Array(entries))
    }

    async fn query_trades(&self, market: &MarketPair) -> Result<Value> {
        let state = self.lock();
        let entries: Vec<Value> = state
            .trades
            .iter()
            .filter(|t| {
                t.get("base").and_then(Value::as_str) == Some(market.base.as_str())
                    && t.get("quote").and_then(Value::as_str) == Some(market.quote.as_str())
            })
            .cloned()
            .collect();
        Ok(Value::Array(entries))
    }

    async fn query_ticker_info(&self, market: &MarketPair) -> Result<Value> {
        let trades = self.query_trades(market).await?;
        let last = trades
            .as_array()
            .and_then(|a| a.last())
            .and_then(|t| t.get("price"))
            .cloned()
            .unwrap_or(Value::Null);
        let volume = trades.as_array().map_or(0, Vec::len);
        Ok(json!({
            "base": market.base,
            "quote": market.quote,
            "last_price": last,
            "trade_count": volume,
        }))
    }

    async fn query_accounts(&self, user_id: UserId) -> Result<Value> {
        let state = self.lock();
        let entries: Vec<Value> = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .map(|a| {
                json!({
                    "currency_code": a.currency,
                    "balance": a.balance.to_string(),
                })
            })
            .collect();
        Ok(Value::Array(entries))
    }

    async fn current_chain_index(&self, user_id: UserId) -> Result<u32> {
        Ok(*self.lock().chain_indices.entry(user_id).or_insert(0))
    }

    async fn settle_open_deposits(&self) -> Result<Vec<DepositEvent>> {
        // One lock acquisition = one transaction: credits and closes
        // land together or not at all.
        let mut state = self.lock();
        let mut settled = Vec::new();
        let open: Vec<(AccountEventId, AccountId, Decimal)> = state
            .deposits
            .iter()
            .filter(|d| d.status == DepositStatus::Open)
            .map(|d| (d.event_id, d.account_id, d.amount))
            .collect();
        for (event_id, account_id, amount) in open {
            let account = state.accounts.get_mut(&account_id).ok_or_else(|| {
                OpenfloorError::Internal(format!("deposit {event_id} targets unknown {account_id}"))
            })?;
            account.balance += amount;
            if let Some(record) = state.deposits.iter_mut().find(|d| d.event_id == event_id) {
                record.status = DepositStatus::Closed;
            }
            settled.push(DepositEvent {
                event_id,
                account_id,
                amount,
            });
        }
        Ok(settled)
    }

    async fn request_withdrawal(
        &self,
        user_id: UserId,
        address: &str,
        amount: Decimal,
    ) -> Result<()> {
        let mut state = self.lock();
        let account = state
            .account_mut(user_id, "BTC")
            .filter(|a| a.balance >= amount)
            .ok_or(OpenfloorError::InsufficientBalance)?;
        account.balance -= amount;
        info!(%user_id, address, %amount, "filed bitcoin withdrawal request");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openfloor_types::OrderSide;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn buy_ticket(price: &str, amount: &str) -> OrderTicket {
        OrderTicket {
            market: MarketPair::new("BTC", "USD"),
            price: dec(price),
            amount: dec(amount),
            side: OrderSide::Buy,
        }
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let engine = MemoryEngine::new();
        engine.create_user("ada", "ada@example.com", "h").await.unwrap();
        let err = engine
            .create_user("ada", "other@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, OpenfloorError::DuplicateUsername { .. }));
    }

    #[tokio::test]
    async fn unknown_username_fails_login_lookup() {
        let engine = MemoryEngine::new();
        let err = engine.authenticate_login("ghost").await.unwrap_err();
        assert!(matches!(err, OpenfloorError::NonexistentUsername));
    }

    #[tokio::test]
    async fn session_key_uniqueness_enforced() {
        let engine = MemoryEngine::new();
        let key = SessionKey::from_bytes([1u8; 32]);
        let user = UserId::new();
        engine.register_session_key(user, &key).await.unwrap();
        let err = engine.register_session_key(user, &key).await.unwrap_err();
        assert!(matches!(err, OpenfloorError::NonuniqueSessionKey));
    }

    #[tokio::test]
    async fn buy_order_deducts_quote_currency() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.credit(user, "USD", dec("250"));

        engine
            .place_order(user, &buy_ticket("100.0000", "2.0000"))
            .await
            .unwrap();

        assert_eq!(engine.balance(user, "USD"), dec("50"));
    }

    #[tokio::test]
    async fn underfunded_order_rejected_without_deduction() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.credit(user, "USD", dec("99"));

        let err = engine
            .place_order(user, &buy_ticket("100.0000", "1.0000"))
            .await
            .unwrap_err();
        assert!(matches!(err, OpenfloorError::InsufficientBalance));
        assert_eq!(engine.balance(user, "USD"), dec("99"));
    }

    #[tokio::test]
    async fn orderbook_reflects_open_orders() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.credit(user, "USD", dec("1000"));
        engine
            .place_order(user, &buy_ticket("100.0000", "1.0000"))
            .await
            .unwrap();

        let book = engine
            .query_orderbook(&MarketPair::new("BTC", "USD"))
            .await
            .unwrap();
        let entries = book.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["order_type"], "Buy");

        let other = engine
            .query_orderbook(&MarketPair::new("ETH", "USD"))
            .await
            .unwrap();
        assert!(other.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn match_queue_drains_in_order() {
        let engine = MemoryEngine::new();
        engine.push_matched_trade(json!({"seq": 1}));
        engine.push_matched_trade(json!({"seq": 2}));

        assert_eq!(
            engine.match_one_order().await.unwrap(),
            Some(json!({"seq": 1}))
        );
        assert_eq!(
            engine.match_one_order().await.unwrap(),
            Some(json!({"seq": 2}))
        );
        assert_eq!(engine.match_one_order().await.unwrap(), None);
    }

    #[tokio::test]
    async fn deposits_settle_exactly_once() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.open_deposit(user, "BTC", dec("0.5"));
        engine.open_deposit(user, "BTC", dec("0.25"));
        assert_eq!(engine.open_deposit_count(), 2);

        let settled = engine.settle_open_deposits().await.unwrap();
        assert_eq!(settled.len(), 2);
        assert_eq!(engine.balance(user, "BTC"), dec("0.75"));
        assert_eq!(engine.open_deposit_count(), 0);

        // Second pass sees nothing: already-closed events never return.
        let settled = engine.settle_open_deposits().await.unwrap();
        assert!(settled.is_empty());
        assert_eq!(engine.balance(user, "BTC"), dec("0.75"));
    }

    #[tokio::test]
    async fn withdrawal_checks_btc_balance() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.credit(user, "BTC", dec("1"));

        engine
            .request_withdrawal(user, "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", dec("0.4"))
            .await
            .unwrap();
        assert_eq!(engine.balance(user, "BTC"), dec("0.6"));

        let err = engine
            .request_withdrawal(user, "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", dec("2"))
            .await
            .unwrap_err();
        assert!(matches!(err, OpenfloorError::InsufficientBalance));
    }

    #[tokio::test]
    async fn accounts_query_lists_balances() {
        let engine = MemoryEngine::new();
        let user = UserId::new();
        engine.credit(user, "BTC", dec("1.5"));
        engine.credit(user, "USD", dec("100"));

        let accounts = engine.query_accounts(user).await.unwrap();
        let entries = accounts.as_array().unwrap();
        assert_eq!(entries.len(), 2);

        let stranger = engine.query_accounts(UserId::new()).await.unwrap();
        assert!(stranger.as_array().unwrap().is_empty());
    }
}
