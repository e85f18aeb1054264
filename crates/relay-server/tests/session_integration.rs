//! Integration tests driving the session manager over real sockets.
//!
//! A channel-backed handler stands in for the production logging handler so
//! the tests can observe exactly which commands were dispatched.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use relay_core::{encode_mouse_move, CommandHandler};
use relay_server::infrastructure::SessionManager;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards each dispatched pointer-motion command to a test channel.
struct ChannelMotionHandler(mpsc::UnboundedSender<(i32, i32)>);

impl CommandHandler for ChannelMotionHandler {
    fn on_mouse_move(&mut self, x: i32, y: i32) {
        let _ = self.0.send((x, y));
    }
}

struct TestServer {
    addr: std::net::SocketAddr,
    moves: mpsc::UnboundedReceiver<(i32, i32)>,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let (tx, moves) = mpsc::unbounded_channel();
        let manager = SessionManager::bind("127.0.0.1:0".parse().unwrap(), ChannelMotionHandler(tx))
            .await
            .unwrap();
        let addr = manager.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(manager.run(Arc::clone(&running)));
        Self {
            addr,
            moves,
            running,
            handle,
        }
    }

    async fn next_move(&mut self) -> (i32, i32) {
        timeout(TEST_TIMEOUT, self.moves.recv())
            .await
            .expect("a dispatched command")
            .expect("handler channel open")
    }

    async fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = timeout(TEST_TIMEOUT, self.handle).await;
    }
}

/// Reads until the peer closes the connection (or errors, which a refused or
/// dropped socket may surface as instead).
async fn wait_for_close(stream: &mut TcpStream) {
    let mut scratch = [0u8; 16];
    loop {
        match timeout(TEST_TIMEOUT, stream.read(&mut scratch))
            .await
            .expect("the server must close this connection")
        {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

#[tokio::test]
async fn complete_records_are_dispatched_to_the_handler() {
    let mut server = TestServer::start().await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    client.write_all(&encode_mouse_move(5, 7)).await.unwrap();
    client
        .write_all(&encode_mouse_move(-1, i32::MAX))
        .await
        .unwrap();

    assert_eq!(server.next_move().await, (5, 7));
    assert_eq!(server.next_move().await, (-1, i32::MAX));

    server.stop().await;
}

#[tokio::test]
async fn a_record_split_across_writes_is_reassembled() {
    let mut server = TestServer::start().await;

    let record = encode_mouse_move(5, 7);
    let mut client = TcpStream::connect(server.addr).await.unwrap();
    client.write_all(&record[..5]).await.unwrap();
    client.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.write_all(&record[5..]).await.unwrap();

    assert_eq!(server.next_move().await, (5, 7));

    server.stop().await;
}

#[tokio::test]
async fn a_second_client_is_refused_while_the_first_is_served() {
    let mut server = TestServer::start().await;

    let mut first = TcpStream::connect(server.addr).await.unwrap();
    first.write_all(&encode_mouse_move(1, 2)).await.unwrap();
    assert_eq!(server.next_move().await, (1, 2));

    // The newcomer is shut down without ever being read from.
    let mut second = TcpStream::connect(server.addr).await.unwrap();
    wait_for_close(&mut second).await;

    // The incumbent's session is untouched.
    first.write_all(&encode_mouse_move(3, 4)).await.unwrap();
    assert_eq!(server.next_move().await, (3, 4));

    server.stop().await;
}

#[tokio::test]
async fn an_unknown_tag_drops_the_client_but_not_the_server() {
    let mut server = TestServer::start().await;

    let mut bad = TcpStream::connect(server.addr).await.unwrap();
    bad.write_all(&encode_mouse_move(9, 9)).await.unwrap();
    assert_eq!(server.next_move().await, (9, 9));

    bad.write_all(&[0xFF]).await.unwrap();
    wait_for_close(&mut bad).await;

    // The slot is free again: a fresh client is served normally.
    let mut next = TcpStream::connect(server.addr).await.unwrap();
    next.write_all(&encode_mouse_move(8, 8)).await.unwrap();
    assert_eq!(server.next_move().await, (8, 8));

    server.stop().await;
}

#[tokio::test]
async fn a_disconnect_frees_the_session_slot() {
    let mut server = TestServer::start().await;

    let mut first = TcpStream::connect(server.addr).await.unwrap();
    first.write_all(&encode_mouse_move(1, 1)).await.unwrap();
    assert_eq!(server.next_move().await, (1, 1));
    drop(first);

    // Give the serve loop a moment to observe the closure, then reconnect.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut second = TcpStream::connect(server.addr).await.unwrap();
    second.write_all(&encode_mouse_move(2, 2)).await.unwrap();
    assert_eq!(server.next_move().await, (2, 2));

    server.stop().await;
}
