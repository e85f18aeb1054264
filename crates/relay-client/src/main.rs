//! Mouse relay client — entry point.
//!
//! Wires together the pointer source, the TCP connector, and the relay
//! dispatch loop, then runs the Tokio async runtime until Ctrl-C or EOF on
//! the pointer source.
//!
//! # Usage
//!
//! ```text
//! relay-client [OPTIONS]
//!
//! Options:
//!   --host <ADDR>            Relay server IP address [default: 127.0.0.1]
//!   --port <PORT>            Relay server TCP port [default: 1234]
//!   --config <PATH>          Optional TOML config file
//!   --reconnect-secs <SECS>  Delay between reconnect attempts [default: 5]
//!   --no-reconnect           Make a single connect attempt and stop retrying
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable             | Default     | Description              |
//! |----------------------|-------------|--------------------------|
//! | `RELAY_SERVER_HOST`  | `127.0.0.1` | Relay server IP address  |
//! | `RELAY_SERVER_PORT`  | `1234`      | Relay server TCP port    |
//!
//! CLI args take precedence over the config file, which takes precedence
//! over built-in defaults.
//!
//! # Pointer input
//!
//! The OS-level mouse hook is a separate collaborator; this headless build
//! reads `X Y` coordinate pairs from stdin, one per line, and relays each as
//! a pointer-motion event.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_client::application::RelayService;
use relay_client::domain::config::ConfigFile;
use relay_client::domain::ClientConfig;
use relay_client::infrastructure::pointer::{stdin::StdinPointerSource, PointerSource};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mouse relay client.
///
/// Captures pointer motion (from stdin in the headless build) and forwards
/// it to the relay server over TCP.
#[derive(Debug, Parser)]
#[command(
    name = "relay-client",
    about = "Forward pointer motion to a relay server over TCP",
    version
)]
struct Cli {
    /// IP address of the relay server.
    #[arg(long, env = "RELAY_SERVER_HOST")]
    host: Option<String>,

    /// TCP port of the relay server.
    #[arg(long, env = "RELAY_SERVER_PORT")]
    port: Option<u16>,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait after a disconnect before the next connect attempt.
    #[arg(long)]
    reconnect_secs: Option<u64>,

    /// Make exactly one connect attempt; never retry after a disconnect.
    #[arg(long, default_value_t = false)]
    no_reconnect: bool,
}

impl Cli {
    /// Merges CLI flags over the config file over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or the resulting
    /// host/port pair is not a valid socket address.
    fn into_client_config(self) -> anyhow::Result<ClientConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let host = self
            .host
            .or(file.server.host)
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = self.port.or(file.server.port).unwrap_or(1234);
        let server_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid server address: '{host}:{port}'"))?;

        let reconnect_interval = if self.no_reconnect {
            None
        } else {
            let secs = self
                .reconnect_secs
                .or(file.client.reconnect_secs)
                .unwrap_or(5);
            // 0 in the config file also means "do not retry".
            (secs > 0).then(|| Duration::from_secs(secs))
        };

        Ok(ClientConfig {
            server_addr,
            reconnect_interval,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_client_config()?;
    info!("mouse relay client starting — server={}", config.server_addr);

    // Shutdown flag shared with the relay loop, cleared on Ctrl-C.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // Start the pointer source on its reader thread and bridge its blocking
    // channel into the Tokio runtime.
    let source = StdinPointerSource::new();
    let blocking_rx = source.start().context("failed to start pointer source")?;
    let (pointer_tx, pointer_rx) = mpsc::channel(256);
    tokio::task::spawn_blocking(move || {
        while let Ok(event) = blocking_rx.recv() {
            if pointer_tx.blocking_send(event).is_err() {
                break;
            }
        }
    });

    RelayService::new(config, pointer_rx).run(running).await;

    source.stop();
    info!("mouse relay client stopped");
    Ok(())
}
