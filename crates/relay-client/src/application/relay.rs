//! The client relay loop: one task multiplexing every input the client has.
//!
//! # Single dispatch loop (for beginners)
//!
//! A native desktop build would multiplex GUI messages, mouse-hook
//! callbacks, and socket readiness on one thread behind a single
//! wait-for-any-event call.  [`RelayService::run`] keeps that shape: one task
//! whose `select!` blocks on *any* pending input —
//!
//! - a pointer event from the capture source,
//! - a socket readiness notification (connect completed / peer closed),
//! - a connection state change for the status read-out,
//! - the reconnect timer, when one is armed.
//!
//! Nothing else in the client blocks, so the loop tolerates indefinitely
//! idle periods and a slow network never stalls the event producer.
//!
//! # Reconnect policy
//!
//! The connector itself never retries: reconnection is this loop's decision,
//! acting as the external collaborator that observes `Disconnected` and
//! issues a fresh connect request after `reconnect_interval`.  With the
//! interval disabled the client makes exactly one attempt per process
//! lifetime.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::domain::connection::{ConnectionState, Connector};
use crate::domain::ClientConfig;
use crate::infrastructure::network::{
    spawn_close_watcher, spawn_connect, SocketEvent, TcpTransport,
};
use crate::infrastructure::pointer::PointerEvent;

/// Capacity of the socket-event channel.  Two tasks at most ever hold a
/// sender (the pending connect and the close watcher), each sending once.
const SOCKET_EVENT_CHANNEL_CAPACITY: usize = 8;

/// How often the loop wakes to re-check the shutdown flag while idle.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Owns the connector and drives it from the event sources.
pub struct RelayService {
    config: ClientConfig,
    connector: Connector<TcpTransport>,
    state_rx: mpsc::UnboundedReceiver<ConnectionState>,
    socket_tx: mpsc::Sender<SocketEvent>,
    socket_rx: mpsc::Receiver<SocketEvent>,
    pointer_rx: mpsc::Receiver<PointerEvent>,
    reconnect_at: Option<Instant>,
}

impl RelayService {
    /// Creates a relay service consuming pointer events from `pointer_rx`.
    pub fn new(config: ClientConfig, pointer_rx: mpsc::Receiver<PointerEvent>) -> Self {
        let (connector, state_rx) = Connector::new();
        let (socket_tx, socket_rx) = mpsc::channel(SOCKET_EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            connector,
            state_rx,
            socket_tx,
            socket_rx,
            pointer_rx,
            reconnect_at: None,
        }
    }

    /// Runs the dispatch loop until `running` clears or the pointer source
    /// ends.
    ///
    /// Issues the initial connect request immediately; whether further
    /// attempts happen is governed by `config.reconnect_interval`.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        self.begin_connect();

        while running.load(Ordering::Relaxed) {
            let reconnect_at = self.reconnect_at;
            tokio::select! {
                maybe_pointer = self.pointer_rx.recv() => {
                    match maybe_pointer {
                        Some(event) => {
                            // Fire and forget: a `false` here means the event
                            // was dropped (not connected, or the send tore
                            // the connection down).  Never retried.
                            self.connector.send_mouse_move(event.x, event.y).await;
                        }
                        None => {
                            info!("pointer source ended; stopping relay loop");
                            break;
                        }
                    }
                }
                maybe_socket = self.socket_rx.recv() => {
                    if let Some(event) = maybe_socket {
                        self.handle_socket_event(event).await;
                    }
                }
                maybe_state = self.state_rx.recv() => {
                    if let Some(state) = maybe_state {
                        self.handle_state_change(state);
                    }
                }
                _ = time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)),
                        if reconnect_at.is_some() => {
                    self.reconnect_at = None;
                    self.begin_connect();
                }
                _ = time::sleep(SHUTDOWN_POLL_INTERVAL) => {
                    // Wake to re-check the shutdown flag.
                }
            }
        }

        info!("relay loop stopped");
    }

    /// Issues a fresh connect request and starts the async connect.
    fn begin_connect(&mut self) {
        self.connector.connect_requested();
        if self.connector.state() == ConnectionState::Connecting {
            info!("connecting to {}", self.config.server_addr);
            spawn_connect(self.config.server_addr, self.socket_tx.clone());
        }
    }

    async fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::ConnectCompleted(Ok(stream)) => {
                let (transport, read_half) = TcpTransport::from_stream(stream);
                // Arm the closure watcher only if this completion will be
                // adopted; a stale one is shut down by the connector.
                if self.connector.state() == ConnectionState::Connecting {
                    spawn_close_watcher(read_half, self.socket_tx.clone());
                }
                self.connector.connect_completed(Ok(transport)).await;
            }
            SocketEvent::ConnectCompleted(Err(e)) => {
                self.connector.connect_completed(Err(e)).await;
            }
            SocketEvent::Closed => {
                self.connector.peer_closed().await;
            }
        }
    }

    /// The status collaborator: render the state, arm the reconnect timer.
    fn handle_state_change(&mut self, state: ConnectionState) {
        info!("connection state: {state}");
        if state == ConnectionState::Disconnected {
            match self.config.reconnect_interval {
                Some(interval) => {
                    debug!("next connect attempt in {interval:?}");
                    self.reconnect_at = Some(Instant::now() + interval);
                }
                None => info!("reconnect disabled; staying disconnected"),
            }
        }
    }
}
