//! Incremental stream framing: reassembling wire commands from TCP chunks.
//!
//! # Why framing is needed (for beginners)
//!
//! TCP is a *byte stream*, not a message stream.  The sender may write one
//! 9-byte command, but the receiver's `read` call can return any split of
//! those bytes: all 9 at once, 5 now and 4 later, or 9 plus the first 3 bytes
//! of the next command.  The [`ReceiveBuffer`] hides this from the rest of
//! the server:
//!
//! 1. Freshly read bytes are appended to the buffered leftovers.
//! 2. A single left-to-right pass decodes and dispatches every complete
//!    command, in order, to a [`CommandHandler`].
//! 3. Any trailing bytes that form only a *partial* command are compacted to
//!    the front of the buffer and kept for the next read.
//!
//! # Capacity limit
//!
//! The buffer is fixed at [`RECV_BUFFER_CAPACITY`] (100) bytes.  This bounds
//! the largest single command the framer can ever reassemble: a command whose
//! record is longer than one buffer-full can never become complete and would
//! wedge the connection.  Only the 9-byte pointer-motion command exists
//! today, so the limit is not binding, but it is part of the protocol
//! contract and must be respected by future command types.
//!
//! # Error policy
//!
//! An unrecognized tag is a fatal [`FramingError`]: the protocol has no
//! length prefix, so there is no way to skip past an unknown command and
//! resynchronize.  The session owner is expected to drop the connection.

use thiserror::Error;

use crate::protocol::codec::{decode_command, ProtocolError, WireCommand};

/// Capacity of the per-connection receive buffer, in bytes.
///
/// Also the upper bound on the encoded size of any single wire command.
pub const RECV_BUFFER_CAPACITY: usize = 100;

/// Errors produced while framing the inbound byte stream.
///
/// Every variant is fatal to the connection that produced it; the process
/// itself keeps running and may accept a new connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The stream contained an unrecognized command tag.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// Appending the new bytes would exceed the buffer capacity.
    ///
    /// Reachable only if the reader hands the framer more bytes than the
    /// buffer's free space, which indicates an oversized command on the wire
    /// or a reader bug.
    #[error("receive buffer overflow: {buffered} buffered + {incoming} incoming exceeds {RECV_BUFFER_CAPACITY}")]
    BufferOverflow { buffered: usize, incoming: usize },
}

/// Receiver of decoded commands, invoked by [`ReceiveBuffer::ingest`].
///
/// One method per wire command type.  The server's production implementation
/// logs pointer motion; tests use recording implementations.
pub trait CommandHandler {
    /// Called for every complete pointer-motion command, in stream order.
    fn on_mouse_move(&mut self, x: i32, y: i32);
}

/// Bounded per-connection receive buffer with partial-command reassembly.
///
/// Invariants:
/// - `len() <= RECV_BUFFER_CAPACITY`.
/// - After every successful [`ingest`](Self::ingest), the buffered bytes are
///   a strict prefix of one not-yet-complete command — never a whole command.
///
/// # Examples
///
/// ```rust
/// use relay_core::{encode_mouse_move, CommandHandler, ReceiveBuffer};
///
/// struct Collect(Vec<(i32, i32)>);
/// impl CommandHandler for Collect {
///     fn on_mouse_move(&mut self, x: i32, y: i32) {
///         self.0.push((x, y));
///     }
/// }
///
/// let mut buffer = ReceiveBuffer::new();
/// let mut handler = Collect(Vec::new());
/// let record = encode_mouse_move(5, 7);
///
/// // First 5 bytes: nothing dispatched, 5 bytes retained.
/// buffer.ingest(&record[..5], &mut handler).unwrap();
/// assert_eq!(buffer.len(), 5);
///
/// // Remaining 4 bytes complete the command.
/// buffer.ingest(&record[5..], &mut handler).unwrap();
/// assert_eq!(handler.0, vec![(5, 7)]);
/// assert_eq!(buffer.len(), 0);
/// ```
pub struct ReceiveBuffer {
    buf: [u8; RECV_BUFFER_CAPACITY],
    len: usize,
}

impl ReceiveBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: [0u8; RECV_BUFFER_CAPACITY],
            len: 0,
        }
    }

    /// Number of buffered bytes (the prefix of an undelivered command).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no partial command is buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space remaining; the reader must not hand `ingest` more than this.
    pub fn free_space(&self) -> usize {
        RECV_BUFFER_CAPACITY - self.len
    }

    /// Appends `new_bytes`, dispatches every complete command to `handler`,
    /// and retains the trailing partial command (if any).
    ///
    /// Returns the number of commands dispatched.  After an `Err` the buffer
    /// contents are unspecified and the connection must be dropped.
    ///
    /// # Errors
    ///
    /// - [`FramingError::Protocol`] on an unrecognized tag.
    /// - [`FramingError::BufferOverflow`] if `new_bytes` exceeds
    ///   [`free_space`](Self::free_space).
    pub fn ingest(
        &mut self,
        new_bytes: &[u8],
        handler: &mut dyn CommandHandler,
    ) -> Result<usize, FramingError> {
        if new_bytes.len() > self.free_space() {
            return Err(FramingError::BufferOverflow {
                buffered: self.len,
                incoming: new_bytes.len(),
            });
        }
        self.buf[self.len..self.len + new_bytes.len()].copy_from_slice(new_bytes);
        let total = self.len + new_bytes.len();

        // Single pass over the combined bytes: dispatch complete commands,
        // stop at the first incomplete one.
        let mut offset = 0;
        let mut dispatched = 0;
        while offset < total {
            match decode_command(&self.buf[offset..total])? {
                Some((command, consumed)) => {
                    dispatch(command, handler);
                    offset += consumed;
                    dispatched += 1;
                }
                None => break, // partial command; wait for more data
            }
        }

        // Compact: move the unconsumed suffix to the front as one atomic
        // retain-suffix operation.
        let leftover = total - offset;
        if leftover > 0 && offset > 0 {
            self.buf.copy_within(offset..total, 0);
        }
        self.len = leftover;
        Ok(dispatched)
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes one decoded command to the matching handler method.
fn dispatch(command: WireCommand, handler: &mut dyn CommandHandler) {
    match command {
        WireCommand::MouseMove { x, y } => handler.on_mouse_move(x, y),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
