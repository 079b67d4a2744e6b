//! Websocket handshake.
//!
//! The client sends a [`Request`], then waits for the server's
//! reply which is parsed and checked into a [`HandshakeResult`].

pub mod key;
pub mod request;
pub mod response;
pub mod extension;

pub use request::Request;
pub use response::HandshakeResult;
pub use extension::Extension;
pub use key::{new_sec_key, derive_accept_key};

/// 64
pub const MAX_ALLOW_HEADERS: usize = 64;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// GET
pub const HTTP_METHOD: &[u8] = b"GET";

/// HTTP/1.1
pub const HTTP_VERSION: &[u8] = b"HTTP/1.1";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

/// Http header, owned name and value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    /// Constructor, take provided name and value.
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check the name, case insensitive.
    #[inline]
    pub fn is(&self, name: &str) -> bool { self.name.eq_ignore_ascii_case(name) }

    /// Check if the comma separated value contains `token`, case insensitive.
    pub fn has_token(&self, token: &str) -> bool {
        self.value
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for HttpHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

macro_rules! header {
    (   $(
            $(#[$docs: meta])*
            ($hdr_name: ident => $name: expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $hdr_name: &str = $name;
        )+
    };
}

macro_rules! write_header {
    ($w: expr, $name: expr, $value: expr) => {{
        $w.extend_from_slice($name.as_bytes());
        $w.extend_from_slice(HTTP_HEADER_SP);
        $w.extend_from_slice($value.as_bytes());
        $w.extend_from_slice(HTTP_LINE_BREAK);
    }};
}

pub(self) use write_header;

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    // header name
    header! {
        (HEADER_HOST_NAME => "Host");

        (HEADER_UPGRADE_NAME => "Upgrade");

        (HEADER_CONNECTION_NAME => "Connection");

        (HEADER_SEC_WEBSOCKET_KEY_NAME => "Sec-WebSocket-Key");

        (HEADER_SEC_WEBSOCKET_ACCEPT_NAME => "Sec-WebSocket-Accept");

        (HEADER_SEC_WEBSOCKET_VERSION_NAME => "Sec-WebSocket-Version");

        (HEADER_SEC_WEBSOCKET_PROTOCOL_NAME => "Sec-WebSocket-Protocol");

        (HEADER_SEC_WEBSOCKET_EXTENSIONS_NAME => "Sec-WebSocket-Extensions");
    }

    // header value
    header! {
        (HEADER_UPGRADE_VALUE => "websocket");

        (HEADER_CONNECTION_VALUE => "Upgrade");

        (HEADER_SEC_WEBSOCKET_VERSION_VALUE => "13");
    }
}
