//! # openfloor-engine
//!
//! **Collaborator Plane**: in-memory reference implementations of the
//! external services the gateway drives through the contracts in
//! [`openfloor_types::external`].
//!
//! These back the bundled binary and the test suites. They implement the
//! contracts faithfully — atomic operations, the documented failure
//! codes, idempotent deposit settlement — but none of the production
//! concerns behind them (durability, real matching, real key
//! derivation, a hardened KDF).

pub mod bitcoin;
pub mod memory;
pub mod password;

pub use bitcoin::DerivedBitcoinApi;
pub use memory::MemoryEngine;
pub use password::Sha256PasswordHasher;
