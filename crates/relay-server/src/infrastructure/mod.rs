//! Infrastructure layer: the TCP listener and the single client session.

pub mod session;

pub use session::{ServerError, SessionManager};
