use super::CloseInfo;
use crate::error::Error;
use crate::handshake::HandshakeResult;

/// Receiver of connection events.
///
/// Every method does nothing by default.
///
/// Exactly one of `on_connected` and `on_error` follows a connect attempt,
/// `on_closed` is called exactly once, when the connection reaches
/// Closed or Failed.
#[allow(unused_variables)]
pub trait Handler {
    fn on_connected(&mut self, result: &HandshakeResult) {}

    fn on_text(&mut self, text: String) {}

    fn on_binary(&mut self, data: Vec<u8>) {}

    fn on_ping(&mut self, payload: &[u8]) {}

    fn on_pong(&mut self, payload: &[u8]) {}

    /// A ping got no pong in time, called once per ping.
    fn on_liveness_failure(&mut self, payload: &[u8]) {}

    fn on_closed(&mut self, info: &CloseInfo) {}

    fn on_error(&mut self, error: &Error) {}
}

/// Discard every event.
impl Handler for () {}
