#![allow(missing_docs)]
//! Errors
//!
//! Every failure of the engine falls into one of four kinds:
//!
//! - [`HandshakeError`]: the upgrade exchange failed, fatal to the attempt.
//! - [`ProtocolError`]: the peer broke the framing protocol, fatal to the
//!   connection which is closed with [`ProtocolError::close_code`].
//! - `Transport`: the underlying byte stream failed.
//! - [`EngineError`]: the caller misused the outbound api.

mod engine;
mod handshake;
mod protocol;

pub use engine::EngineError;
pub use handshake::HandshakeError;
pub use protocol::ProtocolError;

use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Handshake(HandshakeError),

    Protocol(ProtocolError),

    Transport(std::io::Error),

    Engine(EngineError),
}

/// Error kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Handshake,
    Protocol,
    Transport,
    Engine,
}

impl Error {
    /// Get the kind of this error.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Handshake(_) => ErrorKind::Handshake,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Engine(_) => ErrorKind::Engine,
        }
    }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self { Error::Protocol(e) }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self { Error::Engine(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Transport(e) }
}

/// Surface engine errors through `std::io` drivers.
impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        use std::io::ErrorKind as IoKind;
        match e {
            Error::Transport(io) => io,
            Error::Engine(EngineError::NotOpen) => std::io::Error::new(IoKind::NotConnected, e),
            Error::Handshake(_) | Error::Protocol(_) => {
                std::io::Error::new(IoKind::InvalidData, e)
            }
            Error::Engine(_) => std::io::Error::new(IoKind::Other, e),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Handshake(e) => write!(f, "Handshake error: {}", e),
            Protocol(e) => write!(f, "Protocol error: {}", e),
            Transport(e) => write!(f, "Transport error: {}", e),
            Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Handshake(e) => Some(e),
            Protocol(e) => Some(e),
            Transport(e) => Some(e),
            Engine(e) => Some(e),
        }
    }
}
