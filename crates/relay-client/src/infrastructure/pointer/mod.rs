//! Pointer event sources for the client application.
//!
//! The low-level OS mouse hook is an external collaborator: the relay core
//! only consumes `(x, y)` pairs as they occur, with no rate limit imposed
//! here.  The [`PointerSource`] trait abstracts where those pairs come from
//! so the relay loop is testable without OS hooks:
//!
//! - [`mock::MockPointerSource`] lets tests inject synthetic motion.
//! - [`stdin::StdinPointerSource`] reads `X Y` lines for headless operation
//!   and demos.
//!
//! Sources deliver events through a standard `mpsc` channel because hook
//! callbacks and blocking readers live on plain OS threads; `main` bridges
//! the channel into the Tokio runtime.

use std::sync::mpsc;

pub mod mock;
pub mod stdin;

/// One raw pointer-motion sample in virtual screen coordinates.
///
/// Coordinates are signed and may lie outside the addressable display area
/// (multi-monitor desktops place some monitors at negative offsets).  No
/// validation happens at this layer or any layer below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
}

/// Error type for pointer source operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// `start` was called twice.
    #[error("pointer source has already been started")]
    AlreadyStarted,
    /// The underlying reader thread could not be spawned.
    #[error("failed to start pointer reader: {0}")]
    SpawnFailed(String),
}

/// Trait abstracting pointer event production.
pub trait PointerSource: Send {
    /// Starts the source and returns a receiver for captured events.
    ///
    /// The channel closes (receiver yields `Err`) when the source is stopped
    /// or exhausted.
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError>;

    /// Stops the source and releases its resources.
    fn stop(&self);
}
