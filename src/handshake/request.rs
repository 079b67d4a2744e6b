//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once a connection to the server has been established (including a
//! connection via a proxy or over a TLS-encrypted tunnel), the client
//! MUST send an opening handshake to the server.  The handshake consists
//! of an HTTP Upgrade request, along with a list of required and
//! optional header fields.
//!
//! Once the client's opening handshake has been sent, the client MUST
//! wait for a response from the server before sending any further data.
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! Host: www.example.com
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Version: 13
//! ```
//!

use url::Url;

use super::{HttpHeader, Extension};
use super::write_header;
use super::{new_sec_key, derive_accept_key};
use super::{HTTP_METHOD, HTTP_VERSION, HTTP_LINE_BREAK, HTTP_HEADER_SP};
use super::static_headers::*;

use crate::error::HandshakeError;

/// Http upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// `host[:port]`
    pub host: String,
    /// Path and query.
    pub path: String,
    /// Whether the uri asked for `wss`.
    /// TLS itself belongs to the transport.
    pub secure: bool,
    pub sec_key: [u8; 24],
    /// Offered subprotocols, in order of preference.
    pub protocols: Vec<String>,
    /// Offered extensions.
    pub extensions: Vec<Extension>,
    /// Written verbatim after the websocket headers (auth, cookies, ..).
    pub other_headers: Vec<HttpHeader>,
}

impl Request {
    /// Create from a `ws://` or `wss://` uri, with a new random key.
    #[inline]
    pub fn new(uri: &str) -> Result<Self, HandshakeError> { Self::with_key(uri, new_sec_key()) }

    /// Create from a `ws://` or `wss://` uri, with the provided key.
    pub fn with_key(uri: &str, sec_key: [u8; 24]) -> Result<Self, HandshakeError> {
        let url = Url::parse(uri)?;

        let secure = match url.scheme() {
            "ws" | "http" => false,
            "wss" | "https" => true,
            _ => return Err(HandshakeError::UrlScheme),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(HandshakeError::UrlHost),
        };

        // url omits the port if it is the default one
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        Ok(Self::from_parts(host, path, secure, sec_key))
    }

    /// Create with provided host and path, other fields are left empty.
    #[inline]
    pub fn from_parts(host: String, path: String, secure: bool, sec_key: [u8; 24]) -> Self {
        Self {
            host,
            path,
            secure,
            sec_key,
            protocols: Vec::new(),
            extensions: Vec::new(),
            other_headers: Vec::new(),
        }
    }

    /// The `sec-websocket-accept` a server must answer with.
    #[inline]
    pub fn expected_accept(&self) -> [u8; 28] { derive_accept_key(&self.sec_key) }

    /// Check if an extension named `name` was offered.
    #[inline]
    pub fn offers_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Encode to a provided buffer, return the number of written bytes.
    ///
    /// Necessary headers, including `host`, `upgrade`, `connection`,
    /// `sec-websocket-key` and `sec-websocket-version` are written to
    /// the buffer, then the offered protocols and extensions (if any),
    /// then other headers in order.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        let beg = buf.len();

        // GET {path} HTTP/1.1
        buf.extend_from_slice(HTTP_METHOD);
        buf.push(0x20);
        buf.extend_from_slice(self.path.as_bytes());
        buf.push(0x20);
        buf.extend_from_slice(HTTP_VERSION);
        buf.extend_from_slice(HTTP_LINE_BREAK);

        // host: {host}
        write_header!(buf, HEADER_HOST_NAME, self.host);

        // upgrade: websocket
        write_header!(buf, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);

        // connection: upgrade
        write_header!(buf, HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE);

        // sec-websocket-key: {sec_key}
        buf.extend_from_slice(HEADER_SEC_WEBSOCKET_KEY_NAME.as_bytes());
        buf.extend_from_slice(HTTP_HEADER_SP);
        buf.extend_from_slice(&self.sec_key);
        buf.extend_from_slice(HTTP_LINE_BREAK);

        // sec-websocket-version: 13
        write_header!(
            buf,
            HEADER_SEC_WEBSOCKET_VERSION_NAME,
            HEADER_SEC_WEBSOCKET_VERSION_VALUE
        );

        // sec-websocket-protocol: a, b
        if !self.protocols.is_empty() {
            write_header!(buf, HEADER_SEC_WEBSOCKET_PROTOCOL_NAME, self.protocols.join(", "));
        }

        // sec-websocket-extensions: {offer}
        for ext in self.extensions.iter() {
            write_header!(buf, HEADER_SEC_WEBSOCKET_EXTENSIONS_NAME, ext.to_string());
        }

        // other headers
        for hdr in self.other_headers.iter() {
            write_header!(buf, hdr.name, hdr.value);
        }

        // finish with CRLF
        buf.extend_from_slice(HTTP_LINE_BREAK);

        buf.len() - beg
    }
}
