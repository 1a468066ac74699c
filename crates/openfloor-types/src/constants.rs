//! System-wide constants for the OpenFloor gateway.

/// Session keys are raw ed25519 public keys (32 bytes).
pub const SESSION_KEY_LEN: usize = 32;

/// Maximum fractional digits for order prices and amounts.
pub const ORDER_VALUE_PRECISION: u32 = 4;

/// Maximum fractional digits for on-chain amounts (withdrawals, deposits).
pub const AMOUNT_PRECISION: u32 = 8;

/// Currency codes are exactly this many uppercase ASCII letters.
pub const CURRENCY_CODE_LEN: usize = 3;

/// Default client WebSocket listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 8765;

/// Default settlement loop period in milliseconds.
pub const DEFAULT_SETTLEMENT_PERIOD_MS: u64 = 1000;

/// Default per-connection outbound queue capacity.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gateway name.
pub const GATEWAY_NAME: &str = "OpenFloor";
