//! End-to-end tests over real loopback WebSockets.
//!
//! Each test boots a full gateway (in-memory collaborators, settlement
//! loop included) on an ephemeral port and drives it with real clients:
//! register → login → signed commands → broadcasts, plus the
//! silent-discard paths that must produce no response at all.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer, SigningKey};
use futures_util::{SinkExt, StreamExt};
use openfloor_engine::{DerivedBitcoinApi, MemoryEngine, Sha256PasswordHasher};
use openfloor_gateway::GatewayServer;
use openfloor_types::{ExchangeEngine, GatewayConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type ClientStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const RECV_DEADLINE: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

struct TestClient {
    ws: ClientStream,
    signing_key: SigningKey,
    next_id: i64,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("client connects");
        Self {
            ws,
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
            next_id: 0,
        }
    }

    fn session_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    async fn send_raw(&mut self, text: String) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("send succeeds");
    }

    /// Send an unsigned `{command, id, params}` frame.
    async fn send_plain(&mut self, command: &str, params: Value) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.send_raw(json!({"command": command, "id": id, "params": params}).to_string())
            .await;
        id
    }

    /// Send a frame wrapped in the signed envelope.
    async fn send_signed(&mut self, command: &str, params: Value) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        let payload = json!({"command": command, "id": id, "params": params}).to_string();
        let signature = BASE64.encode(self.signing_key.sign(payload.as_bytes()).to_bytes());
        self.send_raw(json!({"payload": payload, "signature": signature}).to_string())
            .await;
        id
    }

    async fn recv(&mut self) -> Value {
        loop {
            let message = tokio::time::timeout(RECV_DEADLINE, self.ws.next())
                .await
                .expect("message within deadline")
                .expect("stream open")
                .expect("transport healthy");
            if let Message::Text(text) = message {
                return serde_json::from_str(text.as_str()).expect("valid json");
            }
        }
    }

    /// Receive until the response correlated to `id`, skipping broadcasts.
    async fn recv_response(&mut self, id: i64) -> Value {
        loop {
            let message = self.recv().await;
            if message.get("id").and_then(Value::as_i64) == Some(id) {
                return message;
            }
            assert!(
                message.get("event").is_some(),
                "unexpected interleaved message: {message}"
            );
        }
    }

    /// Receive until a broadcast of `kind`, skipping other messages.
    async fn recv_event(&mut self, kind: &str) -> Value {
        loop {
            let message = self.recv().await;
            if message.get("event").and_then(Value::as_str) == Some(kind) {
                return message;
            }
        }
    }

    /// Assert nothing arrives within the silence window.
    async fn expect_silence(&mut self) {
        let outcome = tokio::time::timeout(SILENCE_WINDOW, self.ws.next()).await;
        assert!(outcome.is_err(), "expected silence, got {outcome:?}");
    }

    /// Register + login as `username`, consuming the responses (and the
    /// login broadcast this client sees for itself).
    async fn register_and_login(&mut self, username: &str) {
        let id = self
            .send_plain("register", json!([username, format!("{username}@example.com"), "pw"]))
            .await;
        assert_eq!(self.recv_response(id).await["error"], Value::Null);

        let id = self
            .send_plain("login", json!([username, "pw", self.session_key_hex()]))
            .await;
        assert_eq!(self.recv_response(id).await["error"], Value::Null);

        // Drain the login broadcast this client sees for itself.
        self.recv_event("login").await;
    }
}

async fn start_server(settlement_period_ms: u64) -> (String, Arc<MemoryEngine>) {
    let engine = Arc::new(MemoryEngine::new());
    let config = GatewayConfig {
        settlement_period_ms,
        ..GatewayConfig::default()
    };
    let server = GatewayServer::new(
        config,
        engine.clone(),
        Arc::new(DerivedBitcoinApi::new()),
        Arc::new(Sha256PasswordHasher::new()),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    tokio::spawn(server.serve(listener));
    (addr, engine)
}

#[tokio::test]
async fn public_queries_work_while_anonymous() {
    let (addr, _engine) = start_server(60_000).await;
    let mut client = TestClient::connect(&addr).await;

    let id = client.send_plain("fetch_orderbook", json!(["BTC", "USD"])).await;
    let response = client.recv_response(id).await;
    assert_eq!(response["error"], Value::Null);
    assert_eq!(response["result"], json!([]));

    let id = client.send_plain("ticker_info", json!(["BTC", "USD"])).await;
    let response = client.recv_response(id).await;
    assert_eq!(response["error"], Value::Null);
}

#[tokio::test]
async fn authenticated_command_while_anonymous_gets_no_response() {
    let (addr, _engine) = start_server(60_000).await;
    let mut client = TestClient::connect(&addr).await;

    client.send_plain("say_hello", json!(["hi"])).await;
    client.expect_silence().await;

    // The connection is still alive: the next valid request answers.
    let id = client.send_plain("fetch_trades", json!(["BTC", "USD"])).await;
    let response = client.recv_response(id).await;
    assert_eq!(response["error"], Value::Null);
}

#[tokio::test]
async fn malformed_frames_are_discarded_silently() {
    let (addr, _engine) = start_server(60_000).await;
    let mut client = TestClient::connect(&addr).await;

    client.send_raw("not json".to_string()).await;
    client
        .send_raw(json!({"command": "fetch_orderbook", "id": 1, "params": ["BTC"]}).to_string())
        .await;
    client
        .send_raw(json!({"command": "no_such_command", "id": 2, "params": []}).to_string())
        .await;
    client.expect_silence().await;
}

#[tokio::test]
async fn login_failure_paths_return_codes_and_stay_anonymous() {
    let (addr, _engine) = start_server(60_000).await;
    let mut client = TestClient::connect(&addr).await;
    let key = client.session_key_hex();

    let id = client.send_plain("login", json!(["ghost", "pw", key])).await;
    assert_eq!(
        client.recv_response(id).await["error"],
        "nonexistent username"
    );

    let id = client
        .send_plain("register", json!(["ada", "ada@example.com", "pw"]))
        .await;
    assert_eq!(client.recv_response(id).await["error"], Value::Null);

    let key = client.session_key_hex();
    let id = client.send_plain("login", json!(["ada", "wrong", key])).await;
    assert_eq!(client.recv_response(id).await["error"], "wrong password");

    // Still anonymous: authenticated commands stay unanswered.
    client.send_plain("fetch_accounts", json!([])).await;
    client.expect_silence().await;
}

#[tokio::test]
async fn second_login_with_same_session_key_is_rejected() {
    let (addr, _engine) = start_server(60_000).await;
    let mut first = TestClient::connect(&addr).await;
    first.register_and_login("ada").await;

    let mut second = TestClient::connect(&addr).await;
    let reused_key = first.session_key_hex();
    let id = second.send_plain("login", json!(["ada", "pw", reused_key])).await;
    assert_eq!(
        second.recv_response(id).await["error"],
        "nonunique session_key"
    );
}

#[tokio::test]
async fn signed_commands_work_and_unsigned_are_dropped_after_login() {
    let (addr, engine) = start_server(60_000).await;
    let mut client = TestClient::connect(&addr).await;
    client.register_and_login("ada").await;
    let user = engine.user_id("ada").expect("registered");
    engine.credit(user, "USD", "1000".parse().unwrap());

    // Unsigned frames no longer pass.
    client.send_plain("say_hello", json!(["hi"])).await;
    client.expect_silence().await;

    let id = client.send_signed("say_hello", json!(["hi"])).await;
    assert_eq!(client.recv_response(id).await["error"], Value::Null);

    let id = client.send_signed("fetch_accounts", json!([])).await;
    let response = client.recv_response(id).await;
    assert_eq!(response["result"][0]["currency_code"], "USD");

    let id = client.send_signed("get_bitcoin_deposit_address", json!([])).await;
    let address = client.recv_response(id).await["result"]
        .as_str()
        .expect("address string")
        .to_string();
    assert!(address.starts_with('1'));
}

#[tokio::test]
async fn place_order_broadcasts_to_all_connections() {
    let (addr, engine) = start_server(60_000).await;
    let mut trader = TestClient::connect(&addr).await;
    let mut observer = TestClient::connect(&addr).await;
    trader.register_and_login("ada").await;
    let user = engine.user_id("ada").expect("registered");
    engine.credit(user, "USD", "1000".parse().unwrap());

    let id = trader
        .send_signed(
            "place_order",
            json!(["BTC", "USD", "100.0000", "1.0000", "Buy"]),
        )
        .await;
    assert_eq!(trader.recv_response(id).await["error"], Value::Null);

    // Both the observer and the requester see exactly this event.
    for client in [&mut observer, &mut trader] {
        let event = client.recv_event("order").await;
        assert_eq!(event["status"], "ok");
        assert_eq!(event["data"]["price"], "100.0000");
        assert_eq!(event["data"]["amount"], "1.0000");
        assert_eq!(event["data"]["order_type"], "Buy");
        assert_eq!(event["data"]["base"], "BTC");
        assert_eq!(event["data"]["quote"], "USD");
    }
}

#[tokio::test]
async fn underfunded_order_errors_and_produces_no_broadcast() {
    let (addr, engine) = start_server(60_000).await;
    let mut trader = TestClient::connect(&addr).await;
    trader.register_and_login("ada").await;
    let user = engine.user_id("ada").expect("registered");
    engine.credit(user, "USD", "99".parse().unwrap());

    let id = trader
        .send_signed(
            "place_order",
            json!(["BTC", "USD", "100.0000", "1.0000", "Buy"]),
        )
        .await;
    assert_eq!(
        trader.recv_response(id).await["error"],
        "insufficient balance"
    );
    trader.expect_silence().await;
}

#[tokio::test]
async fn settlement_loop_broadcasts_trades_and_closes_deposits() {
    let (addr, engine) = start_server(50).await;
    let mut client = TestClient::connect(&addr).await;

    for seq in 0..3 {
        engine.push_matched_trade(json!({
            "base": "BTC", "quote": "USD", "price": "100.0000", "seq": seq,
        }));
    }
    let user = engine
        .create_user("ada", "ada@example.com", "unused")
        .await
        .expect("create user");
    engine.open_deposit(user, "BTC", "0.5".parse().unwrap());

    // All queued matches drain within one tick, in production order.
    for seq in 0..3 {
        let event = client.recv_event("trade").await;
        assert_eq!(event["data"]["seq"], seq);
    }

    // Deposit credited and closed exactly once.
    let deadline = tokio::time::Instant::now() + RECV_DEADLINE;
    while engine.open_deposit_count() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "deposit never settled");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine.balance(user, "BTC"), "0.5".parse().unwrap());
    client.expect_silence().await;
}
