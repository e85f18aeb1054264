//! # relay-core
//!
//! Shared library for the mouse relay containing the wire protocol codec and
//! the incremental stream framer.
//!
//! This crate is used by both the client and server applications.  It has zero
//! dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The mouse relay forwards pointer-motion events from a *capturing* machine
//! (the client) to a *controlling* machine (the server) over a single TCP
//! connection.  Both sides agree on a tiny binary protocol defined here:
//!
//! - **`protocol::codec`** – How a single command travels over the wire.  A
//!   command is a self-describing record: one tag byte followed by a
//!   tag-dependent payload.  The only tag defined today is pointer motion
//!   (9 bytes total).
//!
//! - **`protocol::framing`** – How a continuous TCP byte stream is split back
//!   into discrete commands.  TCP delivers bytes, not records: one `read` can
//!   return half a command, or three commands plus the first byte of a fourth.
//!   The [`protocol::framing::ReceiveBuffer`] accumulates chunks, dispatches
//!   every complete command, and retains the trailing partial command for the
//!   next read.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `relay_core::encode_mouse_move` instead of the full module path.
pub use protocol::codec::{
    decode_command, encode_mouse_move, ProtocolError, WireCommand, MOUSE_MOVE_LEN, TAG_MOUSE_MOVE,
};
pub use protocol::framing::{CommandHandler, FramingError, ReceiveBuffer, RECV_BUFFER_CAPACITY};
