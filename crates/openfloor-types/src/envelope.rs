//! Server→client wire envelopes.
//!
//! Two shapes leave the gateway: a [`Response`] correlated to one request
//! by its id, and a [`BroadcastEvent`] fanned out to every live
//! connection with no id at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;
use crate::ids::RequestId;

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Direct reply to one request: `{ "id": …, "error": …, "result": … }`.
///
/// Exactly one of `error` / `result` is meaningful. Successful commands
/// that produce no data still take the result side, carrying `null`
/// (`error` is `null`, which is what clients key off).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: RequestId,
    pub error: Option<ErrorCode>,
    pub result: Option<Value>,
}

impl Response {
    /// A success response. `result` may be `Value::Null` for bare acks.
    #[must_use]
    pub fn ok(id: RequestId, result: Value) -> Self {
        Self {
            id,
            error: None,
            result: Some(result),
        }
    }

    /// An error response carrying one of the protocol error strings.
    #[must_use]
    pub fn err(id: RequestId, code: ErrorCode) -> Self {
        Self {
            id,
            error: Some(code),
            result: None,
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// BroadcastEvent
// ---------------------------------------------------------------------------

/// The kind tag of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new trade was matched.
    Trade,
    /// A new order was placed.
    Order,
    /// A client completed a login handshake.
    Login,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trade => write!(f, "trade"),
            Self::Order => write!(f, "order"),
            Self::Login => write!(f, "login"),
        }
    }
}

/// Server-originated event delivered to all live connections:
/// `{ "status": "ok", "event": …, "data": … }`. Carries no request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub status: String,
    pub event: EventKind,
    pub data: Value,
}

impl BroadcastEvent {
    #[must_use]
    pub fn new(event: EventKind, data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            event,
            data,
        }
    }
}
