//! Domain layer for relay-client.
//!
//! Pure connection-lifecycle logic with no dependency on real sockets.  The
//! [`connection::Connector`] state machine is exercised by unit tests through
//! a mock transport and by production code through the TCP transport in the
//! infrastructure layer.

pub mod config;
pub mod connection;

pub use config::ClientConfig;
pub use connection::{ConnectionState, Connector, WireTransport};
