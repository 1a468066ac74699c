//! Inbound frame decoding: signed-envelope unwrap, command shape,
//! schema validation.
//!
//! Once a session holds a key, every frame must be the signed wrapper
//! `{ "payload": <json text>, "signature": <base64> }`; before that,
//! the frame *is* the payload. The payload itself must decode as
//! `{ "command": string, "id": integer, "params": array }`.

use openfloor_types::{BitcoinApi, Request, RequestId, Session};
use serde::Deserialize;
use serde_json::Value;

use crate::schema;
use crate::signature;

/// Why a frame was dropped. Discarded frames get no response — an
/// unparsed message cannot be correlated to a request id — but each
/// reason is distinct so the connection can log it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Signed wrapper missing, malformed, or fields of the wrong type.
    BadEnvelope,
    /// Wrapper was well-formed but the signature did not verify.
    BadSignature,
    /// Payload was not a `{command, id, params}` object.
    BadCommand,
    /// No schema with that command name exists.
    UnknownCommand,
    /// Command exists but requires an authenticated session.
    AuthRequired,
    /// Parameters failed arity or field validation.
    BadParams,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::BadEnvelope => "bad envelope",
            Self::BadSignature => "bad signature",
            Self::BadCommand => "bad command shape",
            Self::UnknownCommand => "unknown command",
            Self::AuthRequired => "authentication required",
            Self::BadParams => "bad parameters",
        };
        write!(f, "{reason}")
    }
}

/// Outcome of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A fully validated request, bound to its typed command.
    Request(Request),
    /// Drop the frame, keep the connection, send nothing.
    Discard(DiscardReason),
}

#[derive(Deserialize)]
struct SignedEnvelope {
    payload: String,
    signature: String,
}

#[derive(Deserialize)]
struct RawRequest {
    command: String,
    id: i64,
    params: Vec<Value>,
}

/// Decode one inbound text frame end-to-end.
#[must_use]
pub fn read_frame(raw: &str, session: &Session, bitcoin: &dyn BitcoinApi) -> FrameOutcome {
    match unwrap_envelope(raw, session) {
        Ok(payload) => parse_request(&payload, session, bitcoin),
        Err(reason) => FrameOutcome::Discard(reason),
    }
}

/// Stage 1: once the session has a key, require and verify the signed
/// wrapper; before login the frame passes through untouched.
fn unwrap_envelope(raw: &str, session: &Session) -> Result<String, DiscardReason> {
    let Some(key) = session.session_key() else {
        return Ok(raw.to_string());
    };

    let envelope: SignedEnvelope =
        serde_json::from_str(raw).map_err(|_| DiscardReason::BadEnvelope)?;

    if !signature::verify(key, &envelope.payload, &envelope.signature) {
        return Err(DiscardReason::BadSignature);
    }

    Ok(envelope.payload)
}

/// Stages 2 and 3: command shape, schema lookup, auth partition, field
/// validation.
fn parse_request(payload: &str, session: &Session, bitcoin: &dyn BitcoinApi) -> FrameOutcome {
    let Ok(raw) = serde_json::from_str::<RawRequest>(payload) else {
        return FrameOutcome::Discard(DiscardReason::BadCommand);
    };

    let Some(schema) = schema::lookup(&raw.command) else {
        return FrameOutcome::Discard(DiscardReason::UnknownCommand);
    };

    if schema.requires_auth && !session.is_authenticated() {
        return FrameOutcome::Discard(DiscardReason::AuthRequired);
    }

    let Some(command) = schema.validate_and_build(&raw.params, bitcoin) else {
        return FrameOutcome::Discard(DiscardReason::BadParams);
    };

    FrameOutcome::Request(Request {
        id: RequestId(raw.id),
        command,
    })
}
