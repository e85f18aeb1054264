//! Binary codec for encoding and decoding mouse relay wire commands.
//!
//! Wire format (big-endian, byte-oriented TCP stream):
//! ```text
//! [tag:1][payload:N]      where N depends on the tag
//! ```
//! The only tag defined today:
//!
//! | Tag  | Meaning        | Payload                 | Total length |
//! |------|----------------|-------------------------|--------------|
//! | 0x01 | pointer motion | x: i32 BE, y: i32 BE    | 9 bytes      |
//!
//! Any other tag value is a protocol violation and terminates the connection
//! (see [`crate::protocol::framing`]).  There is no header, no length prefix,
//! and no sequence number: the tag alone implies the record length.
//!
//! Coordinates are two's-complement signed 32-bit integers.  They may lie
//! outside the display's addressable range; no validation is performed at
//! this layer.

use thiserror::Error;

/// Tag byte identifying a pointer-motion command.
pub const TAG_MOUSE_MOVE: u8 = 0x01;

/// Total encoded length of a pointer-motion command: 1 tag byte + 2 × i32.
pub const MOUSE_MOVE_LEN: usize = 9;

/// Errors that can occur while decoding a wire command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The leading tag byte is not a recognized command type.
    ///
    /// This is always fatal to the connection: with no length prefix there is
    /// no way to resynchronize past an unknown command.
    #[error("unknown command tag: 0x{0:02X}")]
    UnknownTag(u8),
}

/// A decoded wire command.
///
/// One variant per defined tag.  New command types extend this enum together
/// with [`decode_command`] and the [`crate::protocol::framing::CommandHandler`]
/// trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCommand {
    /// The pointer moved to absolute screen coordinates `(x, y)`.
    MouseMove { x: i32, y: i32 },
}

impl WireCommand {
    /// Returns the total encoded length of this command, including the tag.
    pub fn encoded_len(&self) -> usize {
        match self {
            WireCommand::MouseMove { .. } => MOUSE_MOVE_LEN,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a pointer-motion event into its 9-byte wire form.
///
/// Pure function with no failure modes.  Layout:
/// `[TAG_MOUSE_MOVE][x as 4 big-endian bytes][y as 4 big-endian bytes]`.
///
/// # Examples
///
/// ```rust
/// use relay_core::{encode_mouse_move, TAG_MOUSE_MOVE};
///
/// let bytes = encode_mouse_move(5, 7);
/// assert_eq!(bytes[0], TAG_MOUSE_MOVE);
/// assert_eq!(bytes, [1, 0, 0, 0, 5, 0, 0, 0, 7]);
/// ```
pub fn encode_mouse_move(x: i32, y: i32) -> [u8; MOUSE_MOVE_LEN] {
    let mut buf = [0u8; MOUSE_MOVE_LEN];
    buf[0] = TAG_MOUSE_MOVE;
    buf[1..5].copy_from_slice(&x.to_be_bytes());
    buf[5..9].copy_from_slice(&y.to_be_bytes());
    buf
}

/// Decodes one command from the beginning of `bytes`.
///
/// Returns:
/// - `Ok(Some((command, consumed)))` when a complete command is available;
///   `consumed` is the number of bytes the caller should advance by.
/// - `Ok(None)` when the tag is recognized but fewer bytes than the command's
///   full length are available — the caller should retain the bytes and wait
///   for more data.
/// - `Err(ProtocolError::UnknownTag)` when the tag is not recognized.  The
///   connection cannot recover from this.
///
/// `bytes` must be non-empty; the framer never calls this with an empty slice.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownTag`] for an unrecognized leading byte.
///
/// # Examples
///
/// ```rust
/// use relay_core::{decode_command, encode_mouse_move, WireCommand};
///
/// let bytes = encode_mouse_move(-3, 1080);
/// let (cmd, consumed) = decode_command(&bytes).unwrap().unwrap();
/// assert_eq!(cmd, WireCommand::MouseMove { x: -3, y: 1080 });
/// assert_eq!(consumed, bytes.len());
///
/// // A truncated record is not an error, just "need more data":
/// assert_eq!(decode_command(&bytes[..4]).unwrap(), None);
/// ```
pub fn decode_command(bytes: &[u8]) -> Result<Option<(WireCommand, usize)>, ProtocolError> {
    debug_assert!(!bytes.is_empty(), "decode_command requires at least the tag byte");

    match bytes[0] {
        TAG_MOUSE_MOVE => {
            if bytes.len() < MOUSE_MOVE_LEN {
                return Ok(None);
            }
            let x = i32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
            let y = i32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
            Ok(Some((WireCommand::MouseMove { x, y }, MOUSE_MOVE_LEN)))
        }
        other => Err(ProtocolError::UnknownTag(other)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
