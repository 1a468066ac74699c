//! # openfloor-gateway
//!
//! **Gateway Plane**: the real-time front door of the venue.
//!
//! ## Architecture
//!
//! ```text
//! client ──ws── ConnectionActor ── read_frame ── Dispatcher ── ExchangeEngine
//!                    │                                │
//!                    └──────────── GatewayHub ◄───────┘ (order/login events)
//!                                      ▲
//!                  Settler (poll tick) ┘ (trade events, deposit close)
//! ```
//!
//! One task per connection plus one settlement task. Connections process
//! one request at a time (responses are trivially correlated to their
//! request id); the hub fans broadcasts out through per-connection
//! queues so one slow client never stalls another.

pub mod connection;
pub mod dispatch;
pub mod hub;
pub mod server;
pub mod settlement;

pub use connection::ConnectionActor;
pub use dispatch::Dispatcher;
pub use hub::GatewayHub;
pub use server::GatewayServer;
pub use settlement::{Settler, run_polling};
