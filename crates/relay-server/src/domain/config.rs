//! Server configuration types and the optional TOML config file.
//!
//! Built once at startup from three layers, later layers winning:
//!
//! 1. Built-in defaults (listen on `0.0.0.0:1234`).
//! 2. An optional TOML file passed with `--config`:
//!
//!    ```toml
//!    [listen]
//!    bind = "0.0.0.0"
//!    port = 1234
//!    ```
//!
//! 3. CLI flags / environment variables (see `main.rs`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

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

/// All runtime configuration for the relay server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:1234".parse().expect("valid literal address"),
        }
    }
}

// ── TOML file schema ──────────────────────────────────────────────────────────

/// On-disk configuration file.  Every field is optional so a partial file
/// only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub listen: ListenSection,
}

/// `[listen]` section: where to accept clients.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListenSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_listens_on_all_interfaces_port_1234() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr.port(), 1234);
        assert!(cfg.bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_full_config_file_parses() {
        let file = ConfigFile::from_str(
            r#"
            [listen]
            bind = "192.168.0.4"
            port = 4321
            "#,
        )
        .unwrap();
        assert_eq!(file.listen.bind.as_deref(), Some("192.168.0.4"));
        assert_eq!(file.listen.port, Some(4321));
    }

    #[test]
    fn test_partial_config_file_leaves_other_fields_unset() {
        let file = ConfigFile::from_str("[listen]\nport = 9000\n").unwrap();
        assert_eq!(file.listen.port, Some(9000));
        assert_eq!(file.listen.bind, None);
    }

    #[test]
    fn test_empty_config_file_parses_to_defaults() {
        assert_eq!(ConfigFile::from_str("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = ConfigFile::from_str("[listen\nport = oops");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
