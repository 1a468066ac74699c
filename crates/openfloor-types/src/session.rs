//! Per-connection authentication state.
//!
//! A connection starts anonymous. One successful `login` upgrades it to
//! authenticated, binding the session key the client presented; the
//! transition is forward-only and the key stays bound for the remaining
//! lifetime of the connection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SESSION_KEY_LEN;
use crate::ids::UserId;

// ---------------------------------------------------------------------------
// SessionKey
// ---------------------------------------------------------------------------

/// An ed25519 public key (32 bytes) a client registers at login and signs
/// every subsequent message with.
///
/// Travels on the wire as 64 hex characters, either case accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from 64 hex characters. Returns `None` for any other input.
    #[must_use]
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        if hex_str.len() != SESSION_KEY_LEN * 2 {
            return None;
        }
        let mut bytes = [0u8; SESSION_KEY_LEN];
        hex::decode_to_slice(hex_str, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for SessionKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for SessionKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str)
            .ok_or_else(|| serde::de::Error::custom("expected 64 hex characters"))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authenticated half of a session: present iff login succeeded.
///
/// Holding `user_id` and `session_key` in one struct makes the invariant
/// "authenticated iff user id present iff key present" true by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated {
    pub user_id: UserId,
    pub session_key: SessionKey,
}

/// Per-connection authentication state, owned exclusively by its connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    auth: Option<Authenticated>,
}

impl Session {
    /// A fresh anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self { auth: None }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// The verified user, once authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.auth.map(|a| a.user_id)
    }

    /// The bound session key, once authenticated.
    #[must_use]
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.auth.as_ref().map(|a| &a.session_key)
    }

    /// Record a successful login. Anonymous → authenticated only; the
    /// state never reverts within a connection's lifetime.
    pub fn authenticate(&mut self, user_id: UserId, session_key: SessionKey) {
        self.auth = Some(Authenticated {
            user_id,
            session_key,
        });
    }
}
