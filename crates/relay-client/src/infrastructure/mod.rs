//! Infrastructure layer for relay-client.
//!
//! All I/O lives here: the TCP transport and its readiness notifications
//! (`network`) and the sources of raw pointer coordinates (`pointer`).
//!
//! # What does NOT belong here?
//!
//! - Connection lifecycle decisions (that is the domain layer).
//! - The event dispatch loop (that is the application layer).

pub mod network;
pub mod pointer;
