use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    // uri error
    Url(url::ParseError),

    UrlScheme,

    UrlHost,

    // http error
    HttpVersion,

    HttpStatusCode(u16),

    // websocket error
    Upgrade,

    Connection,

    SecWebSocketAccept,

    AcceptMismatch,

    InvalidExtensionNegotiation(String),

    InvalidSubprotocol(String),

    // other error

    // read
    NotEnoughData,

    ResponseTooLarge,

    Httparse(httparse::Error),
}

impl Display for HandshakeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use HandshakeError::*;
        match self {
            // uri error
            Url(e) => write!(f, "Illegal uri: {}", e),

            UrlScheme => write!(f, "Uri scheme should be ws or wss"),

            UrlHost => write!(f, "Missing host in uri"),

            // http error
            HttpVersion => write!(f, "Illegal http version"),

            HttpStatusCode(c) => write!(f, "Illegal http status code: {}", c),

            // websocket error
            Upgrade => write!(f, "Missing or illegal upgrade header"),

            Connection => write!(f, "Missing or illegal connection header"),

            SecWebSocketAccept => {
                write!(f, "Missing sec-websocket-accept header")
            }

            AcceptMismatch => {
                write!(f, "Sec-websocket-accept does not match the key")
            }

            InvalidExtensionNegotiation(ext) => {
                write!(f, "Extension was not offered or repeated: {}", ext)
            }

            InvalidSubprotocol(p) => {
                write!(f, "Subprotocol was not offered: {}", p)
            }

            // other error
            NotEnoughData => write!(f, "Not enough data to parse"),

            ResponseTooLarge => write!(f, "Http response head is too large"),

            Httparse(e) => write!(f, "Http parse error: {}", e),
        }
    }
}

impl From<httparse::Error> for HandshakeError {
    fn from(e: httparse::Error) -> Self { HandshakeError::Httparse(e) }
}

impl From<url::ParseError> for HandshakeError {
    fn from(e: url::ParseError) -> Self { HandshakeError::Url(e) }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandshakeError::Httparse(e) => Some(e),
            HandshakeError::Url(e) => Some(e),
            _ => None,
        }
    }
}
