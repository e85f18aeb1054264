//! Mouse relay server — entry point.
//!
//! Binds the TCP listener, serves one client at a time, and dispatches the
//! client's pointer-motion commands to the logging handler until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! relay-server [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>    Address to listen on [default: 0.0.0.0]
//!   --port <PORT>    TCP port to listen on [default: 1234]
//!   --config <PATH>  Optional TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable      | Default   | Description           |
//! |---------------|-----------|-----------------------|
//! | `RELAY_BIND`  | `0.0.0.0` | Address to listen on  |
//! | `RELAY_PORT`  | `1234`    | TCP port to listen on |
//!
//! CLI args take precedence over the config file, which takes precedence
//! over built-in defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_server::application::LoggingMotionHandler;
use relay_server::domain::config::ConfigFile;
use relay_server::domain::ServerConfig;
use relay_server::infrastructure::SessionManager;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mouse relay server.
///
/// Accepts one relay client and dispatches its pointer-motion commands.
#[derive(Debug, Parser)]
#[command(
    name = "relay-server",
    about = "Receive pointer motion from a relay client over TCP",
    version
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "RELAY_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "RELAY_PORT")]
    port: Option<u16>,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges CLI flags over the config file over built-in defaults.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let bind = self
            .bind
            .or(file.listen.bind)
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = self.port.or(file.listen.port).unwrap_or(1234);
        let bind_addr: SocketAddr = format!("{bind}:{port}")
            .parse()
            .with_context(|| format!("invalid bind address: '{bind}:{port}'"))?;

        Ok(ServerConfig { bind_addr })
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

    let config = Cli::parse().into_server_config()?;
    info!("mouse relay server starting — bind={}", config.bind_addr);

    // Shutdown flag shared with the serve loop, cleared on Ctrl-C.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let manager = SessionManager::bind(config.bind_addr, LoggingMotionHandler::new())
        .await
        .context("failed to start server")?;
    manager.run(running).await;

    info!("mouse relay server stopped");
    Ok(())
}
