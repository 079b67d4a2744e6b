use std::fmt::{Display, Formatter};

/// Violations of the framing protocol.
///
/// [`ProtocolError::NotEnoughData`] is not fatal: it tells the caller
/// to retry once more bytes arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // read
    NotEnoughData,

    // write
    NotEnoughCapacity,

    UnknownOpcode(u8),

    UnsupportedReservedBits(u8),

    MaskRequired,

    UnexpectedMask,

    InvalidLength,

    FragmentedControl,

    ControlFrameTooLong(u64),

    MessageTooLarge,

    UnexpectedOpcode(u8),

    UnexpectedContinuation,

    InvalidUtf8,

    InvalidClosePayload,

    Decompression(String),

    FrameBeforeHandshake,
}

impl ProtocolError {
    /// Close code sent to the peer when this error tears down a connection.
    pub const fn close_code(&self) -> u16 {
        use ProtocolError::*;
        match self {
            MessageTooLarge => 1009,
            InvalidUtf8 | Decompression(_) => 1007,
            _ => 1002,
        }
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ProtocolError::*;
        match self {
            NotEnoughData => write!(f, "Not enough data to parse"),
            NotEnoughCapacity => write!(f, "Not enough space to write to"),
            UnknownOpcode(op) => write!(f, "Unknown opcode: {:#x}", op),
            UnsupportedReservedBits(rsv) => {
                write!(f, "Reserved bits {:#04x} set without an extension", rsv)
            }
            MaskRequired => write!(f, "Frame from a client must be masked"),
            UnexpectedMask => write!(f, "Frame from a server must not be masked"),
            InvalidLength => write!(f, "Illegal 64-bit payload length"),
            FragmentedControl => write!(f, "Control frames can not be fragmented"),
            ControlFrameTooLong(n) => {
                write!(f, "Control frame payload is {} bytes, over 125", n)
            }
            MessageTooLarge => write!(f, "Message exceeds the size limit"),
            UnexpectedOpcode(op) => {
                write!(f, "Opcode {:#x} while a fragmented message is pending", op)
            }
            UnexpectedContinuation => {
                write!(f, "Continuation frame without a pending message")
            }
            InvalidUtf8 => write!(f, "Text payload is not valid utf-8"),
            InvalidClosePayload => write!(f, "Malformed close frame payload"),
            Decompression(e) => write!(f, "Decompression failed: {}", e),
            FrameBeforeHandshake => write!(f, "Websocket data before the upgrade response"),
        }
    }
}

// use default impl
impl std::error::Error for ProtocolError {}
