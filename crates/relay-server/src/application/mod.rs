//! Application layer: what the server does with decoded commands.

pub mod handler;

pub use handler::LoggingMotionHandler;
