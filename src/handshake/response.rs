//! Server upgrade response.
//!
//! From [RFC-6455 Section 4.2.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!

use super::{HttpHeader, Extension, Request};
use super::MAX_ALLOW_HEADERS;
use super::static_headers::*;

use crate::error::HandshakeError;

/// A checked upgrade response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    pub status: u16,
    /// All headers of the response, in order.
    pub headers: Vec<HttpHeader>,
    /// Extensions the server agreed to, with their parameters.
    pub extensions: Vec<Extension>,
    /// Subprotocol the server selected.
    pub protocol: Option<String>,
}

macro_rules! handshake_check {
    ($hdr: expr, $value: expr, $e: expr) => {
        // header value here is case insensitive
        // ref: https://datatracker.ietf.org/doc/html/rfc6455#section-4.1
        match $hdr {
            Some(h) if h.has_token($value) => {}
            _ => return Err($e),
        }
    };
}

impl HandshakeResult {
    /// Parse and check a response to `request` from the provided buffer,
    /// return the result and the number of bytes parsed.
    ///
    /// If the buffer does not contain a complete http response head,
    /// a [`HandshakeError::NotEnoughData`] error will be returned.
    /// Bytes after the head are not touched, they belong to the first frames.
    pub fn decode(buf: &[u8], request: &Request) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut response = httparse::Response::new(&mut headers);

        // return value
        let decode_n = match response.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // check version, should be HTTP/1.1
        if response.version != Some(1_u8) {
            return Err(HandshakeError::HttpVersion);
        }

        // check status code, should be 101
        let status = response.code.unwrap_or_default();
        if status != 101_u16 {
            return Err(HandshakeError::HttpStatusCode(status));
        }

        let headers: Vec<HttpHeader> = response
            .headers
            .iter()
            .map(|h| HttpHeader::new(h.name, String::from_utf8_lossy(h.value)))
            .collect();

        let find = |name: &str| headers.iter().find(|h| h.is(name));

        handshake_check!(
            find(HEADER_UPGRADE_NAME),
            HEADER_UPGRADE_VALUE,
            HandshakeError::Upgrade
        );

        handshake_check!(
            find(HEADER_CONNECTION_NAME),
            HEADER_CONNECTION_VALUE,
            HandshakeError::Connection
        );

        match find(HEADER_SEC_WEBSOCKET_ACCEPT_NAME) {
            None => return Err(HandshakeError::SecWebSocketAccept),
            Some(h) if h.value.trim().as_bytes() != request.expected_accept() => {
                return Err(HandshakeError::AcceptMismatch)
            }
            _ => {}
        };

        // every agreed extension must have been offered, once
        let mut extensions: Vec<Extension> = Vec::new();
        for hdr in headers.iter().filter(|h| h.is(HEADER_SEC_WEBSOCKET_EXTENSIONS_NAME)) {
            for ext in Extension::parse_list(&hdr.value)? {
                let repeated = extensions.iter().any(|e| e.name.eq_ignore_ascii_case(&ext.name));
                if repeated || !request.offers_extension(&ext.name) {
                    return Err(HandshakeError::InvalidExtensionNegotiation(ext.name));
                }
                extensions.push(ext);
            }
        }

        // the selected subprotocol must have been offered
        let protocol = match find(HEADER_SEC_WEBSOCKET_PROTOCOL_NAME) {
            Some(h) if !h.value.trim().is_empty() => {
                let p = h.value.trim();
                if !request.protocols.iter().any(|o| o == p) {
                    return Err(HandshakeError::InvalidSubprotocol(p.to_string()));
                }
                Some(p.to_string())
            }
            _ => None,
        };

        Ok((
            HandshakeResult {
                status,
                headers,
                extensions,
                protocol,
            },
            decode_n,
        ))
    }

    /// Find a response header, case insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }
}
