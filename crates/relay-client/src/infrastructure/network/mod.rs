//! TCP transport and socket readiness notifications for the client.
//!
//! The domain-layer [`Connector`](crate::domain::Connector) is a pure state
//! machine; this module supplies its two inputs from the real network:
//!
//! - [`spawn_connect`] starts a non-blocking TCP connect as a Tokio task and
//!   reports the outcome as [`SocketEvent::ConnectCompleted`].  Registering
//!   the event channel *before* the connect is issued means a completion can
//!   never be missed, even when the connect finishes synchronously (loopback
//!   connects often do).
//! - [`spawn_close_watcher`] parks a task on the read half of an established
//!   stream.  The server never sends application data, so the only things a
//!   read can return are a zero-byte result (peer closed) or an error; either
//!   is reported as [`SocketEvent::Closed`].
//!
//! Both tasks communicate over one `mpsc` channel consumed by the relay
//! loop, which mirrors the single readiness-wait the design is built around:
//! the client thread only ever blocks on "any pending input".

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::connection::WireTransport;

/// Asynchronous socket readiness notifications consumed by the relay loop.
#[derive(Debug)]
pub enum SocketEvent {
    /// The in-flight connect finished, successfully or not.
    ConnectCompleted(io::Result<TcpStream>),
    /// The established connection was closed by the peer (or failed on read).
    Closed,
}

/// Starts a TCP connect to `addr` without blocking the caller.
///
/// The outcome arrives on `events` as a single
/// [`SocketEvent::ConnectCompleted`].  If the receiver is gone by then the
/// result is discarded and the socket (if any) closes on drop.
pub fn spawn_connect(addr: SocketAddr, events: mpsc::Sender<SocketEvent>) {
    tokio::spawn(async move {
        let result = TcpStream::connect(addr).await;
        if let Err(ref e) = result {
            debug!("connect to {addr} failed: {e}");
        }
        let _ = events.send(SocketEvent::ConnectCompleted(result)).await;
    });
}

/// Watches the read half of an established connection for closure.
///
/// Emits exactly one [`SocketEvent::Closed`] and exits.  Inbound bytes are
/// not part of the protocol in this direction and are discarded.
pub fn spawn_close_watcher(mut read_half: OwnedReadHalf, events: mpsc::Sender<SocketEvent>) {
    tokio::spawn(async move {
        let mut scratch = [0u8; 64];
        loop {
            match read_half.read(&mut scratch).await {
                Ok(0) => break,
                Ok(n) => trace!("discarding {n} unexpected bytes from server"),
                Err(e) => {
                    debug!("read error on connection: {e}");
                    break;
                }
            }
        }
        let _ = events.send(SocketEvent::Closed).await;
    });
}

/// [`WireTransport`] backed by the write half of a Tokio TCP stream.
pub struct TcpTransport {
    write_half: OwnedWriteHalf,
}

impl TcpTransport {
    /// Splits `stream` into a transport and the read half for the close
    /// watcher.
    pub fn from_stream(stream: TcpStream) -> (Self, OwnedReadHalf) {
        // Motion events are tiny and latency-sensitive.
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        (Self { write_half }, read_half)
    }
}

#[async_trait]
impl WireTransport for TcpTransport {
    async fn send_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_half.write_all(bytes).await
    }

    async fn shutdown(&mut self) {
        // Best effort; the peer may already be gone.
        let _ = self.write_half.shutdown().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_spawn_connect_reports_failure_for_unreachable_port() {
        let (tx, mut rx) = mpsc::channel(8);
        // Port 1 on loopback is essentially never listening.
        spawn_connect("127.0.0.1:1".parse().unwrap(), tx);

        match rx.recv().await {
            Some(SocketEvent::ConnectCompleted(Err(_))) => {}
            other => panic!("expected a failed completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_connect_reports_success_against_live_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        spawn_connect(addr, tx);

        match rx.recv().await {
            Some(SocketEvent::ConnectCompleted(Ok(_))) => {}
            other => panic!("expected a successful completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_watcher_emits_closed_when_peer_drops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();

        let (_transport, read_half) = TcpTransport::from_stream(client);
        let (tx, mut rx) = mpsc::channel(8);
        spawn_close_watcher(read_half, tx);

        drop(server_side);

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("close must be noticed promptly");
        assert!(matches!(event, Some(SocketEvent::Closed)));
    }

    #[tokio::test]
    async fn test_tcp_transport_send_all_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (mut server_side, _) = listener.accept().await.unwrap();

        let (mut transport, _read_half) = TcpTransport::from_stream(client);
        transport.send_all(&[1, 2, 3, 4]).await.unwrap();

        let mut received = [0u8; 4];
        server_side.read_exact(&mut received).await.unwrap();
        assert_eq!(received, [1, 2, 3, 4]);
    }
}
