use std::fmt::{Display, Formatter};

/// Misuse of the outbound api, returned synchronously.
///
/// These never change the state of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotOpen,

    ConnectionClosing,

    InvalidCloseCode(u16),

    ReasonTooLong(usize),

    ControlPayloadTooLong(usize),

    Compression(String),

    Aborted,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use EngineError::*;
        match self {
            NotOpen => write!(f, "Connection is not open"),
            ConnectionClosing => write!(f, "Connection is closing"),
            InvalidCloseCode(c) => write!(f, "Close code {} can not be sent", c),
            ReasonTooLong(n) => write!(f, "Close reason is {} bytes, over 123", n),
            ControlPayloadTooLong(n) => {
                write!(f, "Control payload is {} bytes, over 125", n)
            }
            Compression(e) => write!(f, "Compression failed: {}", e),
            Aborted => write!(f, "Connection aborted locally"),
        }
    }
}

// use default impl
impl std::error::Error for EngineError {}
