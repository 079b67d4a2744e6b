//! Per-message compression.
//!
//! The engine only negotiates an extension and moves payloads through a
//! [`Compression`]; the algorithm itself is provided by the caller.
//!
//! A compressed message has RSV1 set on its first frame, the payload of
//! every frame of the message is concatenated before it is decompressed.

use std::io;

use crate::handshake::Extension;
use crate::error::HandshakeError;

/// permessage-deflate
pub const PERMESSAGE_DEFLATE: &str = "permessage-deflate";

const SERVER_MAX_WINDOW_BITS: &str = "server_max_window_bits";
const CLIENT_MAX_WINDOW_BITS: &str = "client_max_window_bits";
const SERVER_NO_CONTEXT_TAKEOVER: &str = "server_no_context_takeover";
const CLIENT_NO_CONTEXT_TAKEOVER: &str = "client_no_context_takeover";

/// Pluggable compression capability.
///
/// A `permessage-deflate` capability keeps the agreed [`DeflateParams`]
/// and sizes its deflate streams from them:
///
/// ```
/// use std::io;
/// use wsengine::compression::{Compression, DeflateParams, PERMESSAGE_DEFLATE};
/// use wsengine::error::HandshakeError;
/// use wsengine::handshake::Extension;
///
/// #[derive(Default)]
/// struct Deflate {
///     params: Option<DeflateParams>,
/// }
///
/// impl Compression for Deflate {
///     fn name(&self) -> &str { PERMESSAGE_DEFLATE }
///
///     fn offer(&self) -> Extension { DeflateParams::offer() }
///
///     fn accept(&mut self, agreed: &Extension) -> Result<(), HandshakeError> {
///         self.params = Some(DeflateParams::from_extension(agreed)?);
///         Ok(())
///     }
///
///     fn compress(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
///         // raw deflate with `client_max_window_bits`, trailing 0x00 0x00 0xff 0xff removed
///         todo!()
///     }
///
///     fn decompress(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
///         // append 0x00 0x00 0xff 0xff, then inflate
///         todo!()
///     }
/// }
///
/// let agreed = Extension::parse_list("permessage-deflate; server_max_window_bits=10").unwrap();
/// let mut deflate = Deflate::default();
/// deflate.accept(&agreed[0]).unwrap();
/// assert_eq!(deflate.params.map(|p| p.server_max_window_bits), Some(10));
///
/// let bogus = Extension::parse_list("permessage-deflate; server_max_window_bits=20").unwrap();
/// assert!(deflate.accept(&bogus[0]).is_err());
/// ```
pub trait Compression {
    /// Extension name, used to match the server's agreement.
    fn name(&self) -> &str;

    /// Offer written to the upgrade request.
    fn offer(&self) -> Extension;

    /// Configure from the server's agreement.
    /// An error fails the handshake.
    fn accept(&mut self, agreed: &Extension) -> Result<(), HandshakeError>;

    /// Compress one outgoing message.
    fn compress(&mut self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress one incoming message.
    fn decompress(&mut self, data: &[u8]) -> io::Result<Vec<u8>>;
}

/// Negotiated `permessage-deflate` parameters.
///
/// [RFC-7692 Section 7.1](https://datatracker.ietf.org/doc/html/rfc7692#section-7.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateParams {
    pub server_max_window_bits: u8,
    pub client_max_window_bits: u8,
    pub server_no_context_takeover: bool,
    pub client_no_context_takeover: bool,
}

impl Default for DeflateParams {
    fn default() -> Self {
        Self {
            server_max_window_bits: 15,
            client_max_window_bits: 15,
            server_no_context_takeover: false,
            client_no_context_takeover: false,
        }
    }
}

impl DeflateParams {
    /// The usual offer,
    /// `permessage-deflate; client_max_window_bits; server_max_window_bits=15`.
    pub fn offer() -> Extension {
        Extension::new(PERMESSAGE_DEFLATE)
            .with_param(CLIENT_MAX_WINDOW_BITS, None)
            .with_param(SERVER_MAX_WINDOW_BITS, Some("15"))
    }

    /// Read parameters from the server's agreement.
    ///
    /// Window bits must be in `8..=15`, unknown parameters are rejected.
    pub fn from_extension(ext: &Extension) -> Result<Self, HandshakeError> {
        let invalid = || HandshakeError::InvalidExtensionNegotiation(ext.to_string());

        if !ext.name.eq_ignore_ascii_case(PERMESSAGE_DEFLATE) {
            return Err(invalid());
        }

        let window_bits = |v: Option<&str>| -> Result<u8, HandshakeError> {
            match v {
                // client_max_window_bits may come without a value
                None => Ok(15),
                Some(v) => match v.parse::<u8>() {
                    Ok(bits) if (8..=15).contains(&bits) => Ok(bits),
                    _ => Err(invalid()),
                },
            }
        };

        let mut params = DeflateParams::default();
        for (k, v) in ext.params.iter() {
            let v = v.as_deref();
            match k.to_ascii_lowercase().as_str() {
                SERVER_MAX_WINDOW_BITS => params.server_max_window_bits = window_bits(v)?,
                CLIENT_MAX_WINDOW_BITS => params.client_max_window_bits = window_bits(v)?,
                SERVER_NO_CONTEXT_TAKEOVER => params.server_no_context_takeover = true,
                CLIENT_NO_CONTEXT_TAKEOVER => params.client_no_context_takeover = true,
                _ => return Err(invalid()),
            }
        }

        Ok(params)
    }
}
