//! Control frames.
//!
//! Close codes from [RFC-6455 Section 7.4](https://datatracker.ietf.org/doc/html/rfc6455#section-7.4).

use std::time::Instant;

use crate::error::ProtocolError;

/// Max length of a close reason, 125 - 2.
pub const MAX_CLOSE_REASON: usize = 123;

/// Close codes.
pub mod code {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const PROTOCOL_ERROR: u16 = 1002;
    pub const UNSUPPORTED_DATA: u16 = 1003;
    /// Never sent, reported when a close frame has no code.
    pub const NO_STATUS: u16 = 1005;
    /// Never sent, reported when the connection dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
    pub const INVALID_PAYLOAD: u16 = 1007;
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const MESSAGE_TOO_BIG: u16 = 1009;
    pub const MANDATORY_EXTENSION: u16 = 1010;
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// Check if a code may appear in a close frame.
///
/// `1000..=1003`, `1007..=1014` are defined by the protocol (or registered),
/// `3000..=4999` are left to libraries and applications.
#[inline]
pub const fn is_valid_close_code(code: u16) -> bool {
    matches!(code, 1000..=1003 | 1007..=1014 | 3000..=4999)
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
    /// The code is one that may be sent in a close frame,
    /// or the peer sent no code at all.
    pub standard: bool,
    /// Both close frames were exchanged.
    pub clean: bool,
}

impl CloseInfo {
    /// Close handshake completed with the peer's `code`.
    #[inline]
    pub fn from_peer(code: Option<u16>, reason: String) -> Self {
        match code {
            Some(code) => Self {
                code,
                reason,
                standard: is_valid_close_code(code),
                clean: true,
            },
            None => Self {
                code: code::NO_STATUS,
                reason,
                standard: true,
                clean: true,
            },
        }
    }

    /// Torn down without a close handshake.
    #[inline]
    pub fn abnormal() -> Self {
        Self {
            code: code::ABNORMAL,
            reason: String::new(),
            standard: true,
            clean: false,
        }
    }

    /// Failed on our side with `code`.
    #[inline]
    pub fn failed(code: u16) -> Self {
        Self {
            code,
            reason: String::new(),
            standard: true,
            clean: false,
        }
    }
}

impl std::fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        if !self.clean {
            write!(f, ", unclean")?;
        }
        Ok(())
    }
}

/// Parse a close payload into an optional code and a reason.
pub fn parse_close_payload(payload: &[u8]) -> Result<(Option<u16>, String), ProtocolError> {
    match payload {
        [] => Ok((None, String::new())),
        [_] => Err(ProtocolError::InvalidClosePayload),
        [b1, b2, reason @ ..] => {
            let code = u16::from_be_bytes([*b1, *b2]);
            let reason = std::str::from_utf8(reason).map_err(|_| ProtocolError::InvalidUtf8)?;
            Ok((Some(code), reason.to_string()))
        }
    }
}

/// Build a close payload, no code means an empty payload.
pub fn encode_close_payload(code: Option<u16>, reason: &str) -> Vec<u8> {
    match code {
        Some(code) => {
            let mut buf = Vec::with_capacity(2 + reason.len());
            buf.extend_from_slice(&code.to_be_bytes());
            buf.extend_from_slice(reason.as_bytes());
            buf
        }
        None => Vec::new(),
    }
}

/// Pings waiting for their pong.
#[derive(Debug, Default)]
pub struct PendingPings {
    entries: Vec<(Vec<u8>, Instant)>,
}

impl PendingPings {
    #[inline]
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Remember a ping sent with `payload`.
    #[inline]
    pub fn push(&mut self, payload: Vec<u8>, deadline: Instant) {
        self.entries.push((payload, deadline));
    }

    /// Match a pong against the oldest ping with the same payload,
    /// return true if one was waiting.
    pub fn on_pong(&mut self, payload: &[u8]) -> bool {
        match self.entries.iter().position(|(p, _)| p == payload) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove and return every ping past its deadline.
    pub fn expire(&mut self, now: Instant) -> Vec<Vec<u8>> {
        let mut expired = Vec::new();
        self.entries.retain(|(payload, deadline)| {
            if *deadline <= now {
                expired.push(payload.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    #[inline]
    pub fn clear(&mut self) { self.entries.clear(); }
}
