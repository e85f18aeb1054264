//! The accept loop and the single client session it serves.
//!
//! # One client at a time (for beginners)
//!
//! The server deliberately serves a single client: one desk, one mouse.  The
//! listener stays open the whole time, but while a session is live every
//! further `accept` is answered by immediately shutting the new connection
//! down — the incumbent keeps its session.  When the incumbent disconnects
//! (or commits a protocol violation) the session slot is cleared and the
//! next `accept` is adopted.
//!
//! # Event loop shape
//!
//! [`SessionManager::run`] is one task multiplexing three things with
//! `select!`: the listener, the live session's socket (when there is one),
//! and a short periodic sleep so the shutdown flag is re-checked even when
//! the network is idle.
//!
//! # Framing
//!
//! Bytes from the session socket are fed to the session's [`ReceiveBuffer`],
//! which decodes as many complete commands as the stream contains and
//! dispatches each to the injected [`CommandHandler`].  Reads are capped at
//! the buffer's free space, so a client can never overrun the fixed-size
//! receive window.  A framing error (unknown command tag) is unrecoverable
//! for that connection: the session is dropped, the listener keeps serving.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use relay_core::{CommandHandler, ReceiveBuffer, RECV_BUFFER_CAPACITY};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{error, info, trace};

/// How often the loop wakes to re-check the shutdown flag while idle.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound (port in use, no permission).
    #[error("failed to bind listener on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// The one live client connection, with its per-connection framing state.
struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: ReceiveBuffer,
}

impl Session {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            buffer: ReceiveBuffer::new(),
        }
    }
}

/// Owns the listener, at most one [`Session`], and the command handler.
pub struct SessionManager<H> {
    listener: TcpListener,
    session: Option<Session>,
    handler: H,
}

impl<H: CommandHandler + Send> SessionManager<H> {
    /// Binds the listener and returns a manager ready to [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the configured address cannot
    /// be bound.
    pub async fn bind(bind_addr: SocketAddr, handler: H) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: bind_addr,
                source,
            })?;
        Ok(Self {
            listener,
            session: None,
            handler,
        })
    }

    /// The actual bound address; useful when the configured port was `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves clients until `running` clears.
    ///
    /// Client-level failures (disconnects, framing violations, recv errors)
    /// clear the session and the loop keeps accepting; they never end the
    /// loop.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        match self.local_addr() {
            Ok(addr) => info!("serving on {addr}"),
            Err(e) => info!("serving (local address unavailable: {e})"),
        }

        while running.load(Ordering::Relaxed) {
            match self.session.as_mut() {
                Some(session) => {
                    let free = session.buffer.free_space();
                    let mut chunk = [0u8; RECV_BUFFER_CAPACITY];
                    let mut drop_session = false;
                    tokio::select! {
                        accepted = self.listener.accept() => {
                            Self::refuse(accepted, session.peer).await;
                        }
                        read = session.stream.read(&mut chunk[..free]) => {
                            drop_session =
                                Self::handle_read(session, read, &chunk, &mut self.handler);
                        }
                        _ = time::sleep(SHUTDOWN_POLL_INTERVAL) => {
                            // Wake to re-check the shutdown flag.
                        }
                    }
                    if drop_session {
                        self.close_session().await;
                    }
                }
                None => {
                    tokio::select! {
                        accepted = self.listener.accept() => {
                            self.adopt(accepted);
                        }
                        _ = time::sleep(SHUTDOWN_POLL_INTERVAL) => {}
                    }
                }
            }
        }

        self.close_session().await;
        info!("server stopped");
    }

    /// Takes an accepted connection as the live session.
    fn adopt(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        match accepted {
            Ok((stream, peer)) => {
                info!("client {peer} connected");
                self.session = Some(Session::new(stream, peer));
            }
            Err(e) => error!("accept failed: {e}"),
        }
    }

    /// Shuts down a connection that arrived while a session is live.
    async fn refuse(accepted: io::Result<(TcpStream, SocketAddr)>, incumbent: SocketAddr) {
        match accepted {
            Ok((mut stream, peer)) => {
                info!("refusing new client {peer} (already serving {incumbent})");
                let _ = stream.shutdown().await;
            }
            Err(e) => error!("accept failed: {e}"),
        }
    }

    /// Feeds one read's worth of bytes through the framer.
    ///
    /// Returns `true` when the session must be dropped: orderly close, recv
    /// error, or a framing violation.
    fn handle_read(
        session: &mut Session,
        read: io::Result<usize>,
        chunk: &[u8],
        handler: &mut H,
    ) -> bool {
        let peer = session.peer;
        match read {
            Ok(0) => {
                info!("client {peer} disconnected");
                true
            }
            Ok(n) => match session.buffer.ingest(&chunk[..n], handler) {
                Ok(dispatched) => {
                    trace!("dispatched {dispatched} command(s) from {peer}");
                    false
                }
                Err(e) => {
                    error!("framing error from {peer}: {e}; dropping client");
                    true
                }
            },
            Err(e) => {
                error!("recv from {peer} failed: {e}; dropping client");
                true
            }
        }
    }

    /// Clears the session slot, shutting the socket down best-effort.
    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.stream.shutdown().await;
            info!("session with {} closed", session.peer);
        }
    }
}
