//! Connection settings.

use std::time::Duration;

use crate::compression::Compression;

/// 16 MiB
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 << 20;

/// 64 MiB
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 << 20;

/// 16 KiB
pub const DEFAULT_MAX_HANDSHAKE_SIZE: usize = 16 << 10;

/// 10s
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// 5s
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Limits, timers and policies of one connection.
pub struct Config {
    /// Max payload of a single incoming frame.
    pub max_frame_size: usize,

    /// Max size of an assembled incoming message, after decompression.
    pub max_message_size: usize,

    /// Max size of the upgrade response head.
    pub max_handshake_size: usize,

    /// How long a ping may stay unanswered.
    pub ping_timeout: Duration,

    /// How long to wait for the peer's close frame after sending ours.
    pub close_timeout: Duration,

    /// Send a ping after this much time without traffic.
    pub ping_interval: Option<Duration>,

    /// Answer pings automatically.
    pub auto_pong: bool,

    /// Start a close (1001) when a ping expires.
    pub close_on_liveness_failure: bool,

    /// Code used to echo every peer close instead of the peer's code.
    pub close_echo_code: Option<u16>,

    /// Split outgoing messages into frames of at most this size.
    pub fragment_size: Option<usize>,

    /// Offered to the server, used if agreed.
    pub compression: Option<Box<dyn Compression + Send>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_handshake_size: DEFAULT_MAX_HANDSHAKE_SIZE,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            ping_interval: None,
            auto_pong: true,
            close_on_liveness_failure: false,
            close_echo_code: None,
            fragment_size: None,
            compression: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("max_frame_size", &self.max_frame_size)
            .field("max_message_size", &self.max_message_size)
            .field("max_handshake_size", &self.max_handshake_size)
            .field("ping_timeout", &self.ping_timeout)
            .field("close_timeout", &self.close_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("auto_pong", &self.auto_pong)
            .field("close_on_liveness_failure", &self.close_on_liveness_failure)
            .field("close_echo_code", &self.close_echo_code)
            .field("fragment_size", &self.fragment_size)
            .field("compression", &self.compression.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
