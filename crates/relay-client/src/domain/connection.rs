//! The client connection state machine.
//!
//! # The three states (for beginners)
//!
//! The client holds at most one outbound connection to the relay server, and
//! that connection is always in exactly one of three states:
//!
//! ```text
//! Disconnected --connect_requested--> Connecting
//! Connecting   --connect_completed(Ok)--> Connected
//! Connecting   --connect_completed(Err)--> Disconnected
//! Connected    --peer_closed / send failure--> Disconnected
//! ```
//!
//! The [`Connector`] owns the state and the write side of the socket (as a
//! [`WireTransport`]).  It never blocks: the actual TCP connect runs as an
//! async task in the infrastructure layer, and its outcome is fed back in via
//! [`Connector::connect_completed`].  While the connect is in flight the
//! pending future owns the socket, so the connector holds a transport exactly
//! when the state is [`ConnectionState::Connected`].
//!
//! # Delivery semantics
//!
//! This is a fire-and-forget telemetry feed, not a reliable channel.  A send
//! that cannot deliver all bytes shuts the socket down, drops the connection,
//! and *discards* the triggering event — nothing is requeued or retried.
//! Reconnecting is the caller's decision, made after observing the
//! `Disconnected` notification.
//!
//! # Notifications
//!
//! Every state transition is published on an unbounded channel so a status
//! collaborator (a UI, or the logging task in the headless build) can render
//! the current state.  The notifications are informational only; nothing in
//! the state machine depends on them being consumed.

use std::fmt;
use std::io;

use async_trait::async_trait;
use relay_core::encode_mouse_move;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Connection lifecycle state, as rendered by the status collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket is held.  The only state from which a connect may start.
    Disconnected,
    /// A non-blocking connect is in flight; its completion has not arrived.
    Connecting,
    /// The connection is established and events may be sent.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The exact strings the status read-out shows.
        match self {
            ConnectionState::Disconnected => write!(f, "not connected"),
            ConnectionState::Connecting => write!(f, "connecting..."),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Write side of an established connection.
///
/// The production implementation wraps a Tokio TCP stream; unit tests use an
/// in-memory mock.  `send_all` must either deliver every byte or fail — the
/// caller treats any error as grounds for dropping the connection.
#[async_trait]
pub trait WireTransport: Send {
    /// Writes all of `bytes`, looping until done or an error occurs.
    async fn send_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Shuts the underlying socket down.  Errors are irrelevant at this point
    /// and are swallowed by implementations.
    async fn shutdown(&mut self);
}

/// The client connector: one outbound connection, driven by completion and
/// closure notifications.
///
/// Invariant: `transport` is `Some` if and only if `state` is `Connected`.
pub struct Connector<T: WireTransport> {
    state: ConnectionState,
    transport: Option<T>,
    state_tx: mpsc::UnboundedSender<ConnectionState>,
}

impl<T: WireTransport> Connector<T> {
    /// Creates a disconnected connector together with the receiver for state
    /// change notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            state: ConnectionState::Disconnected,
            transport: None,
            state_tx: tx,
        };
        (connector, rx)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a transport is currently held (true exactly when connected).
    pub fn holds_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Records that a connect has been issued: `Disconnected → Connecting`.
    ///
    /// Ignored (with a log) in any other state — the caller must not start a
    /// second connect while one connection exists.
    pub fn connect_requested(&mut self) {
        if self.state != ConnectionState::Disconnected {
            warn!("connect requested while {}; ignored", self.state);
            return;
        }
        self.set_state(ConnectionState::Connecting);
    }

    /// Delivers the outcome of the in-flight connect.
    ///
    /// `Ok(transport)` moves to `Connected` and adopts the transport;
    /// `Err` moves back to `Disconnected`.  A completion that arrives in any
    /// state other than `Connecting` is stale (the connection was torn down
    /// while the connect was racing) and its transport is shut down and
    /// discarded.
    pub async fn connect_completed(&mut self, result: io::Result<T>) {
        if self.state != ConnectionState::Connecting {
            if let Ok(mut transport) = result {
                debug!("stale connect completion while {}; closing", self.state);
                transport.shutdown().await;
            }
            return;
        }
        match result {
            Ok(transport) => {
                self.transport = Some(transport);
                self.set_state(ConnectionState::Connected);
            }
            Err(e) => {
                info!("connect failed: {e}");
                self.set_state(ConnectionState::Disconnected);
            }
        }
    }

    /// Handles a closure notification from the peer: `Connected → Disconnected`.
    pub async fn peer_closed(&mut self) {
        if self.state != ConnectionState::Connected {
            debug!("peer-closed notification while {}; ignored", self.state);
            return;
        }
        info!("server closed the connection");
        self.drop_connection().await;
    }

    /// Encodes and sends one pointer-motion event.
    ///
    /// A no-op returning `false` unless the state is `Connected`.  On any
    /// send failure the socket is shut down, the state transitions to
    /// `Disconnected`, and the event is dropped — `false` is returned and the
    /// caller must not retry the event.
    pub async fn send_mouse_move(&mut self, x: i32, y: i32) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }
        let bytes = encode_mouse_move(x, y);
        // Connected implies a held transport; treat a violation as a torn
        // connection rather than a panic.
        let Some(transport) = self.transport.as_mut() else {
            warn!("connected without a transport; resetting");
            self.drop_connection().await;
            return false;
        };
        match transport.send_all(&bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!("send failed, dropping connection: {e}");
                self.drop_connection().await;
                false
            }
        }
    }

    /// Shuts down and releases the transport, then publishes `Disconnected`.
    async fn drop_connection(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.shutdown().await;
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        // Informational; a missing consumer must never wedge the data path.
        let _ = self.state_tx.send(state);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory transport recording every write, optionally failing sends.
    struct MockTransport {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        shutdowns: Arc<AtomicUsize>,
        fail_sends: bool,
    }

    impl MockTransport {
        fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>, Arc<AtomicUsize>) {
            let writes = Arc::new(Mutex::new(Vec::new()));
            let shutdowns = Arc::new(AtomicUsize::new(0));
            let transport = Self {
                writes: Arc::clone(&writes),
                shutdowns: Arc::clone(&shutdowns),
                fail_sends: false,
            };
            (transport, writes, shutdowns)
        }

        fn failing() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>, Arc<AtomicUsize>) {
            let (mut transport, writes, shutdowns) = Self::new();
            transport.fail_sends = true;
            (transport, writes, shutdowns)
        }
    }

    #[async_trait]
    impl WireTransport for MockTransport {
        async fn send_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            if self.fail_sends {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
            }
            self.writes.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        async fn shutdown(&mut self) {
            self.shutdowns.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConnectionState>) -> Vec<ConnectionState> {
        let mut states = Vec::new();
        while let Ok(state) = rx.try_recv() {
            states.push(state);
        }
        states
    }

    // ── State transitions ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_then_failure_ends_disconnected_without_transport() {
        let (mut connector, mut rx) = Connector::<MockTransport>::new();

        connector.connect_requested();
        assert_eq!(connector.state(), ConnectionState::Connecting);

        connector
            .connect_completed(Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused",
            )))
            .await;

        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert!(!connector.holds_transport());
        assert_eq!(
            drain(&mut rx),
            vec![ConnectionState::Connecting, ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_connect_then_success_then_send_writes_exactly_one_record() {
        let (mut connector, _rx) = Connector::new();
        let (transport, writes, _shutdowns) = MockTransport::new();

        connector.connect_requested();
        connector.connect_completed(Ok(transport)).await;
        assert_eq!(connector.state(), ConnectionState::Connected);
        assert!(connector.holds_transport());

        assert!(connector.send_mouse_move(5, 7).await);

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1, "exactly one write on the wire");
        assert_eq!(writes[0], encode_mouse_move(5, 7).to_vec());
        assert_eq!(writes[0].len(), 9);
    }

    #[tokio::test]
    async fn test_peer_closed_transitions_to_disconnected() {
        let (mut connector, mut rx) = Connector::new();
        let (transport, _writes, shutdowns) = MockTransport::new();

        connector.connect_requested();
        connector.connect_completed(Ok(transport)).await;
        connector.peer_closed().await;

        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert!(!connector.holds_transport());
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);
        assert_eq!(
            drain(&mut rx),
            vec![
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Disconnected
            ]
        );
    }

    // ── Send semantics ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_while_disconnected_is_a_noop() {
        let (mut connector, _rx) = Connector::<MockTransport>::new();
        assert!(!connector.send_mouse_move(1, 2).await);
        assert_eq!(connector.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_while_connecting_is_a_noop() {
        let (mut connector, _rx) = Connector::<MockTransport>::new();
        connector.connect_requested();
        assert!(!connector.send_mouse_move(1, 2).await);
        assert_eq!(connector.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_send_failure_disconnects_and_discards_the_event() {
        let (mut connector, _rx) = Connector::new();
        let (transport, writes, shutdowns) = MockTransport::failing();

        connector.connect_requested();
        connector.connect_completed(Ok(transport)).await;

        assert!(!connector.send_mouse_move(3, 4).await);

        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert!(!connector.holds_transport());
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1, "socket shut down once");
        assert!(writes.lock().unwrap().is_empty(), "the event is dropped");

        // No retry of the dropped event: a later send while disconnected
        // stays a no-op.
        assert!(!connector.send_mouse_move(3, 4).await);
        assert!(writes.lock().unwrap().is_empty());
    }

    // ── Defensive edges ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_requested_ignored_while_connecting() {
        let (mut connector, mut rx) = Connector::<MockTransport>::new();
        connector.connect_requested();
        connector.connect_requested();
        assert_eq!(connector.state(), ConnectionState::Connecting);
        assert_eq!(drain(&mut rx), vec![ConnectionState::Connecting]);
    }

    #[tokio::test]
    async fn test_stale_connect_completion_is_shut_down_and_discarded() {
        let (mut connector, _rx) = Connector::new();
        let (transport, _writes, shutdowns) = MockTransport::new();

        // No connect in flight; this completion lost the race with a teardown.
        connector.connect_completed(Ok(transport)).await;

        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert!(!connector.holds_transport());
        assert_eq!(shutdowns.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_display_strings_match_status_readout() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "not connected");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting...");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
