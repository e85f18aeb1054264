//! Protocol module containing the wire command codec and the stream framer.

pub mod codec;
pub mod framing;

pub use codec::{decode_command, encode_mouse_move, ProtocolError, WireCommand};
pub use framing::{CommandHandler, FramingError, ReceiveBuffer};
