//! # openfloor-types
//!
//! Shared types, errors, and collaborator contracts for the **OpenFloor**
//! trading-venue gateway.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`AccountId`], [`AccountEventId`], [`ConnectionId`], [`RequestId`], [`MarketPair`]
//! - **Session model**: [`Session`], [`SessionKey`]
//! - **Command model**: [`Command`], [`Request`]
//! - **Order model**: [`OrderSide`], [`OrderTicket`]
//! - **Wire envelopes**: [`Response`], [`BroadcastEvent`], [`EventKind`]
//! - **Errors**: [`OpenfloorError`] with `OF_ERR_` prefix codes, [`ErrorCode`] wire strings
//! - **Configuration**: [`GatewayConfig`]
//! - **Collaborator contracts**: [`ExchangeEngine`], [`BitcoinApi`], [`PasswordHasher`]
//! - **Constants**: system-wide limits and defaults

pub mod command;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod external;
pub mod ids;
pub mod order;
pub mod session;

// Re-export all primary types at crate root for ergonomic imports:
//   use openfloor_types::{Command, Session, Response, ...};

pub use command::*;
pub use config::*;
pub use envelope::*;
pub use error::*;
pub use external::*;
pub use ids::*;
pub use order::*;
pub use session::*;

// Constants are accessed via `openfloor_types::constants::FOO`
// (not re-exported to avoid name collisions).
