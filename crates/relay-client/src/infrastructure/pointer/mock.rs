//! Mock pointer source for unit testing.
//!
//! Allows tests to inject synthetic [`PointerEvent`]s without an OS hook or
//! a terminal attached.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{CaptureError, PointerEvent, PointerSource};

/// A mock implementation of [`PointerSource`] that lets tests inject events.
pub struct MockPointerSource {
    sender: Arc<Mutex<Option<Sender<PointerEvent>>>>,
}

impl MockPointerSource {
    /// Creates a new mock pointer source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a synthetic motion event, as if captured from hardware.
    ///
    /// Panics if `start()` has not been called or `stop()` already has.
    pub fn inject(&self, x: i32, y: i32) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(PointerEvent { x, y })
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockPointerSource::inject called before start()");
        }
    }
}

impl Default for MockPointerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerSource for MockPointerSource {
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_delivers_injected_events_in_order() {
        let source = MockPointerSource::new();
        let rx = source.start().unwrap();

        source.inject(1, 2);
        source.inject(3, 4);

        assert_eq!(rx.recv().unwrap(), PointerEvent { x: 1, y: 2 });
        assert_eq!(rx.recv().unwrap(), PointerEvent { x: 3, y: 4 });
    }

    #[test]
    fn test_double_start_is_rejected() {
        let source = MockPointerSource::new();
        let _rx = source.start().unwrap();
        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));
    }

    #[test]
    fn test_stop_closes_the_channel() {
        let source = MockPointerSource::new();
        let rx = source.start().unwrap();
        source.stop();
        assert!(rx.recv().is_err(), "channel must close on stop");
    }
}
