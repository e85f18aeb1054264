//! Client configuration types and the optional TOML config file.
//!
//! [`ClientConfig`] is the single source of truth for runtime settings.  It
//! is built once at startup from three layers, later layers winning:
//!
//! 1. Built-in defaults (`127.0.0.1:1234`, reconnect every 5 s).
//! 2. An optional TOML file passed with `--config`:
//!
//!    ```toml
//!    [server]
//!    host = "192.168.0.4"
//!    port = 1234
//!
//!    [client]
//!    reconnect_secs = 5
//!    ```
//!
//! 3. CLI flags / environment variables (see `main.rs`).
//!
//! Keeping the merged result as a plain struct (no global state, no
//! environment reads inside the domain) keeps the relay loop easy to embed in
//! tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime configuration for the relay client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the relay server's TCP listener.
    pub server_addr: SocketAddr,

    /// How long to wait after observing `Disconnected` before issuing a fresh
    /// connect request.  `None` disables automatic reconnection: the client
    /// then makes exactly one connection attempt per process lifetime.
    pub reconnect_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:1234".parse().expect("valid literal address"),
            reconnect_interval: Some(Duration::from_secs(5)),
        }
    }
}

// ── TOML file schema ──────────────────────────────────────────────────────────

/// On-disk configuration file.  Every field is optional so a partial file
/// only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
}

/// `[server]` section: where to connect.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[client]` section: connection behaviour.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ClientSection {
    /// Seconds between reconnect attempts; `0` disables reconnection.
    pub reconnect_secs: Option<u64>,
}

impl ConfigFile {
    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text)
    }

    /// Parses config file content from a string (used by [`load`](Self::load)
    /// and by tests).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
