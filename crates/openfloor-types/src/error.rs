//! Error types for the OpenFloor gateway.
//!
//! All errors use the `OF_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Account / authentication errors
//! - 2xx: Balance errors
//! - 3xx: Command errors
//! - 7xx: Transport errors
//! - 9xx: General / internal errors
//!
//! Only a subset of errors is ever shown to clients: [`ErrorCode`] is the
//! closed set of wire strings a response envelope may carry. Everything
//! without a wire mapping is a programming or infrastructure failure that
//! aborts the request (and possibly the connection), never masked as a
//! business error.

use thiserror::Error;

/// Central error enum for all OpenFloor operations.
#[derive(Debug, Error)]
pub enum OpenfloorError {
    // =================================================================
    // Account / Authentication Errors (1xx)
    // =================================================================
    /// The username contains characters outside `[a-zA-Z0-9_.]`.
    #[error("OF_ERR_100: Invalid username: {username}")]
    InvalidUsername { username: String },

    /// A user with this username already exists.
    #[error("OF_ERR_101: Duplicate username: {username}")]
    DuplicateUsername { username: String },

    /// No user with this username exists.
    #[error("OF_ERR_102: Nonexistent username")]
    NonexistentUsername,

    /// The password did not match the stored hash.
    #[error("OF_ERR_103: Wrong password")]
    WrongPassword,

    /// The presented session key was already registered by an earlier login.
    #[error("OF_ERR_104: Session key already registered")]
    NonuniqueSessionKey,

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough balance to place the order or withdraw.
    #[error("OF_ERR_200: Insufficient balance")]
    InsufficientBalance,

    // =================================================================
    // Command Errors (3xx)
    // =================================================================
    /// The command is recognized but not implemented by this engine.
    #[error("OF_ERR_300: Unimplemented command")]
    Unimplemented,

    // =================================================================
    // Transport Errors (7xx)
    // =================================================================
    /// WebSocket / socket level failure on one connection.
    #[error("OF_ERR_700: Transport error: {reason}")]
    Transport { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OF_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OF_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid listen address, bad env value, etc.).
    #[error("OF_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (socket, disk).
    #[error("OF_ERR_903: I/O error: {0}")]
    Io(String),
}

impl OpenfloorError {
    /// The wire error code for this failure, if it is a recognized
    /// business-rule violation. `None` means the failure must not be
    /// masked as a client-visible error.
    #[must_use]
    pub fn wire_code(&self) -> Option<ErrorCode> {
        match self {
            Self::InvalidUsername { .. } => Some(ErrorCode::InvalidUsername),
            Self::DuplicateUsername { .. } => Some(ErrorCode::DuplicateUsername),
            Self::NonexistentUsername => Some(ErrorCode::NonexistentUsername),
            Self::WrongPassword => Some(ErrorCode::WrongPassword),
            Self::NonuniqueSessionKey => Some(ErrorCode::NonuniqueSessionKey),
            Self::InsufficientBalance => Some(ErrorCode::InsufficientBalance),
            Self::Unimplemented => Some(ErrorCode::Unimplemented),
            Self::Transport { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_)
            | Self::Io(_) => None,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenfloorError>;

// Conversion from std::io::Error
impl From<std::io::Error> for OpenfloorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for OpenfloorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// ErrorCode — the closed set of client-visible error strings
// ---------------------------------------------------------------------------

/// Error strings a response envelope may carry. The wire spellings are
/// fixed protocol constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidUsername,
    DuplicateUsername,
    NonexistentUsername,
    WrongPassword,
    NonuniqueSessionKey,
    InsufficientBalance,
    Unimplemented,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUsername => "invalid username",
            Self::DuplicateUsername => "duplicate username",
            Self::NonexistentUsername => "nonexistent username",
            Self::WrongPassword => "wrong password",
            Self::NonuniqueSessionKey => "nonunique session_key",
            Self::InsufficientBalance => "insufficient balance",
            Self::Unimplemented => "unimplemented",
        }
    }

    /// Parse a wire string back into its code.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "invalid username" => Some(Self::InvalidUsername),
            "duplicate username" => Some(Self::DuplicateUsername),
            "nonexistent username" => Some(Self::NonexistentUsername),
            "wrong password" => Some(Self::WrongPassword),
            "nonunique session_key" => Some(Self::NonuniqueSessionKey),
            "insufficient balance" => Some(Self::InsufficientBalance),
            "unimplemented" => Some(Self::Unimplemented),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str_opt(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code: {s}")))
    }
}
