//! Line-oriented pointer source for headless operation.
//!
//! Reads whitespace-separated `X Y` coordinate pairs from standard input,
//! one per line, and emits them as [`PointerEvent`]s.  Handy for demos and
//! end-to-end testing without an OS mouse hook:
//!
//! ```text
//! $ printf '10 20\n-5 700\n' | relay-client --host 192.168.0.4
//! ```
//!
//! Lines that do not parse as two integers are logged and skipped.  The
//! channel closes on EOF or when [`PointerSource::stop`] drops the receiver
//! side's peer.

use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};

use tracing::warn;

use super::{CaptureError, PointerEvent, PointerSource};

/// Pointer source that parses coordinate pairs from stdin on a reader thread.
pub struct StdinPointerSource {
    started: AtomicBool,
    stopped: Arc<AtomicBool>,
}

impl StdinPointerSource {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for StdinPointerSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one `X Y` line into a [`PointerEvent`].
fn parse_line(line: &str) -> Option<PointerEvent> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None; // trailing garbage
    }
    Some(PointerEvent { x, y })
}

impl PointerSource for StdinPointerSource {
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::clone(&self.stopped);

        std::thread::Builder::new()
            .name("stdin-pointer".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if stopped.load(Ordering::Relaxed) {
                        break;
                    }
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("stdin read error: {e}");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Some(event) => {
                            if tx.send(event).is_err() {
                                break; // consumer gone
                            }
                        }
                        None => warn!("ignoring malformed input line: {line:?}"),
                    }
                }
            })
            .map_err(|e| CaptureError::SpawnFailed(e.to_string()))?;

        Ok(rx)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}
