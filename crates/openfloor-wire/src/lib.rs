//! # openfloor-wire
//!
//! **Protocol Plane**: everything between a raw inbound text frame and a
//! typed [`Request`](openfloor_types::Request).
//!
//! ## Decode pipeline
//!
//! ```text
//! raw frame → signed-envelope unwrap → command shape → schema validation
//!           → FrameOutcome::Request | FrameOutcome::Discard(reason)
//! ```
//!
//! Malformed input at any stage is *discarded*, never answered: a
//! response to an unparsed message could not be correlated to a request
//! id. [`FrameOutcome`] makes that an explicit value, so callers (and
//! tests) distinguish "reject, no response" from "reject, error
//! response".

pub mod field;
pub mod frame;
pub mod schema;
pub mod signature;

pub use field::FieldSpec;
pub use frame::{DiscardReason, FrameOutcome, read_frame};
pub use schema::{CommandSchema, lookup};
