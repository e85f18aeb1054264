//! Application layer for relay-client.
//!
//! Contains the relay dispatch loop that ties pointer events, socket
//! readiness notifications, and the connection state machine together.

pub mod relay;

pub use relay::RelayService;
