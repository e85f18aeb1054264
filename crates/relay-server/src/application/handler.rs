//! Command handlers: the server-side consumers of decoded pointer events.
//!
//! The session layer decodes wire commands and hands them to a
//! [`CommandHandler`]; everything downstream of the protocol (injecting the
//! motion into the local desktop, aggregating it, recording it) lives behind
//! that trait.  The production binary currently ships [`LoggingMotionHandler`]
//! only — pointer injection into the host is the designated extension point.

use relay_core::CommandHandler;
use tracing::warn;

/// Logs every pointer-motion command instead of injecting it.
///
/// Keeps a running count so operators (and tests) can see that traffic is
/// flowing even when the log level filters the per-event lines out.
#[derive(Debug, Default)]
pub struct LoggingMotionHandler {
    moves: u64,
}

impl LoggingMotionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pointer-motion commands dispatched so far.
    pub fn moves(&self) -> u64 {
        self.moves
    }
}

impl CommandHandler for LoggingMotionHandler {
    fn on_mouse_move(&mut self, x: i32, y: i32) {
        self.moves += 1;
        warn!("mouse move {x} x {y} not implemented");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_counts_dispatched_moves() {
        let mut handler = LoggingMotionHandler::new();
        assert_eq!(handler.moves(), 0);

        handler.on_mouse_move(5, 7);
        handler.on_mouse_move(-1, i32::MAX);
        assert_eq!(handler.moves(), 2);
    }
}
