//! Key exchange.

use super::GUID;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// Generate a new `sec-websocket-key`.
#[inline]
pub fn new_sec_key() -> [u8; 24] {
    let input: [u8; 16] = rand::random();
    let mut output = [0_u8; 24];
    // 16 bytes always encode to 24
    let n = STANDARD.encode_slice(input, &mut output).unwrap_or(0);
    debug_assert_eq!(n, 24);
    output
}

/// Derive `sec-websocket-accept` from `sec-websocket-key`.
#[inline]
pub fn derive_accept_key(sec_key: &[u8]) -> [u8; 28] {
    let mut sha1 = Sha1::default();
    sha1.update(sec_key);
    sha1.update(GUID);
    let input = sha1.finalize();
    let mut output = [0_u8; 28];
    // 20 bytes always encode to 28
    let n = STANDARD.encode_slice(input, &mut output).unwrap_or(0);
    debug_assert_eq!(n, 28);
    output
}
