//! Domain layer: server configuration.

pub mod config;

pub use config::ServerConfig;
