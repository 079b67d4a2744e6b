//! Websocket connection.
//!
//! A [`Connection`] owns all protocol state of one session and never does
//! io on its own: bytes read from the transport are pushed in with
//! [`on_data`](Connection::on_data), outgoing bytes are handed to a
//! [`Transport`], events are delivered to a [`Handler`].
//!
//! Timers are driven from outside as well, by calling
//! [`tick`](Connection::tick) periodically.
//!
//! ```ignore
//! {
//!     let request = Request::new("ws://example.com/chat")?;
//!     let mut conn = Connection::connect(transport, handler, request, Config::default());
//!     // bytes from the socket
//!     conn.on_data(&buf[..n]);
//!     // once open
//!     conn.send_text("hello")?;
//!     conn.close(1000, "bye")?;
//! }
//! ```

mod ctrl;
mod read;
mod write;
mod state;
mod collect;
mod handler;
mod transport;

pub use ctrl::{code, is_valid_close_code, CloseInfo, MAX_CLOSE_REASON};
pub use ctrl::{parse_close_payload, encode_close_payload, PendingPings};
pub use collect::{Collector, Collected, Message};
pub use state::State;
pub use handler::Handler;
pub use transport::Transport;

use std::collections::VecDeque;
use std::time::Instant;

use crate::role::Client;
use crate::config::Config;
use crate::compression::Compression;
use crate::frame::{FrameCodec, MaskSource, RandMask};
use crate::handshake::{HandshakeResult, Request};
use crate::error::Error;

/// Client side websocket connection.
pub struct Connection<T, H, M = RandMask> {
    transport: T,
    handler: H,
    mask: M,
    config: Config,
    request: Request,
    state: State,

    // read
    inbuf: Vec<u8>,
    codec: FrameCodec<Client>,
    collector: Collector,
    handshake: Option<HandshakeResult>,
    compression: Option<Box<dyn Compression + Send>>,

    // write
    outq: VecDeque<Vec<u8>>,
    out_offset: usize,
    close_sent: bool,

    // control
    pings: PendingPings,
    ping_nonce: u64,
    close_received: Option<CloseInfo>,
    close_deadline: Option<Instant>,
    last_activity: Instant,

    // teardown
    released: bool,
    closed_reported: bool,
    error: Option<Error>,
}

impl<T: Transport, H: Handler> Connection<T, H, RandMask> {
    /// Start a connection over an established transport.
    ///
    /// The upgrade request is written right away, the connection stays
    /// [`State::Connecting`] until the response arrives through
    /// [`on_data`](Self::on_data).
    #[inline]
    pub fn connect(transport: T, handler: H, request: Request, config: Config) -> Self {
        Self::connect_with_mask(transport, handler, request, config, RandMask)
    }
}

impl<T: Transport, H: Handler, M: MaskSource> Connection<T, H, M> {
    /// Same as [`connect`](Connection::connect), with a custom source of mask keys.
    pub fn connect_with_mask(
        transport: T,
        handler: H,
        mut request: Request,
        config: Config,
        mask: M,
    ) -> Self {
        if let Some(c) = config.compression.as_ref() {
            if !request.offers_extension(c.name()) {
                request.extensions.push(c.offer());
            }
        }

        let mut conn = Connection {
            transport,
            handler,
            mask,
            codec: FrameCodec::new(config.max_frame_size as u64),
            collector: Collector::new(config.max_message_size),
            config,
            request,
            state: State::Connecting,
            inbuf: Vec::new(),
            handshake: None,
            compression: None,
            outq: VecDeque::new(),
            out_offset: 0,
            close_sent: false,
            pings: PendingPings::new(),
            ping_nonce: 0,
            close_received: None,
            close_deadline: None,
            last_activity: Instant::now(),
            released: false,
            closed_reported: false,
            error: None,
        };

        let mut buf = Vec::with_capacity(256);
        conn.request.encode(&mut buf);
        log::debug!("connecting to {}{}", conn.request.host, conn.request.path);
        conn.outq.push_back(buf);
        conn.flush();

        conn
    }
}

impl<T, H, M> Connection<T, H, M> {
    #[inline]
    pub const fn state(&self) -> State { self.state }

    #[inline]
    pub fn handler(&self) -> &H { &self.handler }

    #[inline]
    pub fn handler_mut(&mut self) -> &mut H { &mut self.handler }

    #[inline]
    pub fn transport(&self) -> &T { &self.transport }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }

    #[inline]
    pub fn config(&self) -> &Config { &self.config }

    #[inline]
    pub fn request(&self) -> &Request { &self.request }

    /// The checked upgrade response, once open.
    #[inline]
    pub fn handshake(&self) -> Option<&HandshakeResult> { self.handshake.as_ref() }

    /// Subprotocol selected by the server.
    #[inline]
    pub fn protocol(&self) -> Option<&str> {
        self.handshake.as_ref().and_then(|h| h.protocol.as_deref())
    }

    /// Check if a compression extension is in use.
    #[inline]
    pub fn is_compressed(&self) -> bool { self.compression.is_some() }

    /// Number of pings still waiting for a pong.
    #[inline]
    pub fn pending_pings(&self) -> usize { self.pings.len() }

    /// Number of bytes queued but not yet taken by the transport.
    #[inline]
    pub fn buffered_amount(&self) -> usize {
        self.outq.iter().map(Vec::len).sum::<usize>() - self.out_offset
    }

    /// Take the error which failed the connection.
    /// The handler has seen it already.
    #[inline]
    pub fn take_error(&mut self) -> Option<Error> { self.error.take() }
}

impl<T: Transport, H: Handler, M: MaskSource> Connection<T, H, M> {
    /// Run timers.
    ///
    /// Expired pings are reported (and may start a close), a keepalive
    /// ping is sent when the connection has been idle long enough, and a
    /// close handshake that takes too long is given up.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            State::Open => {
                let expired = self.pings.expire(now);
                for payload in expired.iter() {
                    log::warn!("ping {:?} got no pong", payload);
                    self.handler.on_liveness_failure(payload);
                }

                if !expired.is_empty() && self.config.close_on_liveness_failure {
                    self.start_close(Some(code::GOING_AWAY), "");
                } else if let Some(interval) = self.config.ping_interval {
                    if now.saturating_duration_since(self.last_activity) >= interval {
                        log::trace!("keepalive ping");
                        let _ = self.send_ping(None);
                    }
                }
                self.flush();
            }
            State::Closing => match self.close_deadline {
                Some(deadline) if now >= deadline => {
                    log::warn!("close handshake timed out");
                    self.state = State::Closed;
                    self.release();
                    self.report_closed(CloseInfo::abnormal());
                }
                _ => {}
            },
            _ => {}
        }
    }

    /// Tear down because of `err`.
    ///
    /// A protocol error still sends a close frame with the matching code,
    /// anything else drops the transport right away.
    fn fail(&mut self, err: Error) {
        if self.state.is_terminal() {
            return;
        }

        let info = match &err {
            // no websocket yet, nothing to close
            Error::Protocol(e) if self.state == State::Connecting => {
                log::warn!("protocol error while connecting: {}", e);
                CloseInfo::abnormal()
            }
            Error::Protocol(e) => {
                let code = e.close_code();
                log::warn!("protocol error: {}, closing with {}", e, code);
                self.queue_close(Some(code), "");
                // best effort, the peer may be gone already
                let _ = self.write_queued();
                CloseInfo::failed(code)
            }
            e => {
                log::warn!("connection failed: {}", e);
                CloseInfo::abnormal()
            }
        };

        self.state = State::Failed;
        self.release();
        self.handler.on_error(&err);
        self.error = Some(err);
        self.report_closed(info);
    }

    /// Give the transport back, once.
    ///
    /// Unread bytes are dropped, a frame half handed to the transport
    /// is finished if it takes it, frames not started are dropped.
    fn release(&mut self) {
        if self.released {
            return;
        }

        self.inbuf = Vec::new();
        self.collector.clear();
        self.pings.clear();

        if self.out_offset > 0 {
            self.outq.truncate(1);
            let _ = self.write_queued();
        }
        self.outq.clear();
        self.out_offset = 0;

        self.released = true;
        log::debug!("release transport, state: {}", self.state);
        self.transport.close();
    }

    fn report_closed(&mut self, info: CloseInfo) {
        if self.closed_reported {
            return;
        }
        self.closed_reported = true;
        log::debug!("closed: {}", info);
        self.handler.on_closed(&info);
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::io;
    use std::time::Duration;
    use crate::frame::{Fin, Frame, FixedMask, Mask, OpCode, Rsv};
    use crate::role::Server;

    pub const KEY: [u8; 24] = *b"dGhlIHNhbXBsZSBub25jZQ==";

    pub const RESPONSE: &[u8] = b"\
        HTTP/1.1 101 Switching Protocols\r\n\
        upgrade: websocket\r\n\
        connection: upgrade\r\n\
        sec-websocket-accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

    /// Takes at most `limit` bytes per write.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        pub written: Vec<u8>,
        pub limit: Option<usize>,
        pub blocked: bool,
        pub broken: bool,
        pub closed: usize,
    }

    impl Transport for MockTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.broken {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"));
            }
            if self.blocked {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = self.limit.map_or(buf.len(), |l| l.min(buf.len()));
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn close(&mut self) { self.closed += 1; }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Connected,
        Text(String),
        Binary(Vec<u8>),
        Ping(Vec<u8>),
        Pong(Vec<u8>),
        Liveness(Vec<u8>),
        Closed(CloseInfo),
        Error(String),
    }

    #[derive(Debug, Default)]
    pub struct Recorder {
        pub events: Vec<Event>,
    }

    impl Recorder {
        pub fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
            self.events.iter().filter(|e| f(e)).count()
        }

        pub fn closed(&self) -> Vec<&CloseInfo> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Closed(info) => Some(info),
                    _ => None,
                })
                .collect()
        }
    }

    impl Handler for Recorder {
        fn on_connected(&mut self, _: &HandshakeResult) { self.events.push(Event::Connected); }

        fn on_text(&mut self, text: String) { self.events.push(Event::Text(text)); }

        fn on_binary(&mut self, data: Vec<u8>) { self.events.push(Event::Binary(data)); }

        fn on_ping(&mut self, payload: &[u8]) { self.events.push(Event::Ping(payload.to_vec())); }

        fn on_pong(&mut self, payload: &[u8]) { self.events.push(Event::Pong(payload.to_vec())); }

        fn on_liveness_failure(&mut self, payload: &[u8]) {
            self.events.push(Event::Liveness(payload.to_vec()));
        }

        fn on_closed(&mut self, info: &CloseInfo) { self.events.push(Event::Closed(info.clone())); }

        fn on_error(&mut self, error: &Error) { self.events.push(Event::Error(error.to_string())); }
    }

    pub type TestConn = Connection<MockTransport, Recorder, FixedMask>;

    pub fn request() -> Request { Request::with_key("ws://www.example.com/ws", KEY).unwrap() }

    pub fn connecting(config: Config) -> TestConn {
        let mut conn = Connection::connect_with_mask(
            MockTransport::default(),
            Recorder::default(),
            request(),
            config,
            FixedMask([1, 2, 3, 4]),
        );
        // forget the request
        conn.transport_mut().written.clear();
        conn
    }

    pub fn open(config: Config) -> TestConn {
        let mut conn = connecting(config);
        conn.on_data(RESPONSE);
        assert_eq!(conn.state(), State::Open);
        assert_eq!(conn.handler_mut().events.drain(..).collect::<Vec<_>>(), vec![Event::Connected]);
        conn
    }

    /// Frame written by a server.
    pub fn server_frame(fin: Fin, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        Frame::new(fin, Rsv::NONE, opcode, Mask::None, payload.to_vec()).encode(&mut buf);
        buf
    }

    /// Frames the client wrote so far.
    pub fn written_frames(conn: &TestConn) -> Vec<Frame> {
        let codec = FrameCodec::<Server>::new(1 << 24);
        let mut buf = &conn.transport().written[..];
        let mut frames = Vec::new();
        while !buf.is_empty() {
            let (frame, n) = codec.decode(buf).unwrap();
            frames.push(frame);
            buf = &buf[n..];
        }
        frames
    }

    #[test]
    fn handshake_flow() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut conn = Connection::connect_with_mask(
            MockTransport::default(),
            Recorder::default(),
            request(),
            Config::default(),
            FixedMask([1, 2, 3, 4]),
        );
        assert_eq!(conn.state(), State::Connecting);

        let mut expected = Vec::new();
        request().encode(&mut expected);
        assert_eq!(conn.transport().written, expected);

        // sending before open
        assert_eq!(conn.send_text("x"), Err(crate::error::EngineError::NotOpen));
        assert_eq!(conn.close(1000, ""), Err(crate::error::EngineError::NotOpen));

        // response in small pieces, followed by a frame in the same read
        let mut data = RESPONSE.to_vec();
        data.extend(server_frame(Fin::Y, OpCode::Text, b"hi"));
        for chunk in data.chunks(7) {
            conn.on_data(chunk);
        }

        assert_eq!(conn.state(), State::Open);
        assert_eq!(conn.handshake().map(|h| h.status), Some(101));
        assert_eq!(
            conn.handler().events,
            vec![Event::Connected, Event::Text("hi".into())]
        );
    }

    #[test]
    fn handshake_failure() {
        let mut conn = connecting(Config::default());
        conn.on_data(
            b"HTTP/1.1 101 Switching Protocols\r\n\
            upgrade: websocket\r\n\
            connection: upgrade\r\n\
            sec-websocket-accept: AAAAAAAAAAAAAAAAAAAAAAAAAAA=\r\n\r\n",
        );

        assert_eq!(conn.state(), State::Failed);
        assert_eq!(conn.transport().closed, 1);
        assert!(conn.transport().written.is_empty());
        assert!(matches!(conn.handler().events[0], Event::Error(_)));
        assert_eq!(conn.handler().closed(), vec![&CloseInfo::abnormal()]);
        assert!(matches!(
            conn.take_error(),
            Some(Error::Handshake(crate::error::HandshakeError::AcceptMismatch))
        ));

        // ignored from now on
        conn.on_data(RESPONSE);
        conn.on_transport_closed();
        assert_eq!(conn.handler().events.len(), 2);
    }

    #[test]
    fn handshake_too_large() {
        let mut config = Config::default();
        config.max_handshake_size = 64;
        let mut conn = connecting(config);
        conn.on_data(b"HTTP/1.1 101 Switching Protocols\r\n");
        assert_eq!(conn.state(), State::Connecting);
        conn.on_data(&[b'x'; 64]);
        assert_eq!(conn.state(), State::Failed);
        assert!(matches!(
            conn.take_error(),
            Some(Error::Handshake(crate::error::HandshakeError::ResponseTooLarge))
        ));
    }

    #[test]
    fn frame_while_connecting() {
        let mut conn = connecting(Config::default());
        conn.on_data(&server_frame(Fin::Y, OpCode::Text, b"early"));

        assert_eq!(conn.state(), State::Failed);
        assert!(conn.transport().written.is_empty());
        assert_eq!(conn.transport().closed, 1);
        assert_eq!(conn.handler().count(|e| matches!(e, Event::Text(_))), 0);
        assert_eq!(conn.handler().count(|e| matches!(e, Event::Error(_))), 1);
        assert_eq!(conn.handler().closed(), vec![&CloseInfo::abnormal()]);
        assert!(matches!(
            conn.take_error(),
            Some(Error::Protocol(crate::error::ProtocolError::FrameBeforeHandshake))
        ));

        // a split status line is still a response
        let mut conn = connecting(Config::default());
        conn.on_data(b"HT");
        conn.on_data(b"TP/1.1 10");
        assert_eq!(conn.state(), State::Connecting);
        conn.on_data(&RESPONSE[11..]);
        assert_eq!(conn.state(), State::Open);
    }

    #[test]
    fn eof_while_connecting() {
        let mut conn = connecting(Config::default());
        conn.on_transport_closed();
        assert_eq!(conn.state(), State::Failed);
        assert_eq!(conn.handler().count(|e| matches!(e, Event::Error(_))), 1);
        assert_eq!(conn.handler().closed(), vec![&CloseInfo::abnormal()]);
        assert_eq!(conn.transport().closed, 1);
    }

    #[test]
    fn eof_while_open() {
        let mut conn = open(Config::default());
        conn.on_transport_closed();
        assert_eq!(conn.state(), State::Closed);
        assert_eq!(conn.handler().events, vec![Event::Closed(CloseInfo::abnormal())]);
        assert_eq!(conn.transport().closed, 1);
    }

    #[test]
    fn transport_error() {
        let mut conn = open(Config::default());
        conn.on_transport_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(conn.state(), State::Failed);
        assert_eq!(conn.handler().events.len(), 2);
        assert!(matches!(conn.handler().events[0], Event::Error(_)));
        assert_eq!(conn.handler().events[1], Event::Closed(CloseInfo::abnormal()));
        assert!(conn.transport().written.is_empty());

        // broken on write
        let mut conn = open(Config::default());
        conn.transport_mut().broken = true;
        assert_eq!(conn.send_binary(b"x"), Ok(()));
        assert_eq!(conn.state(), State::Failed);
        assert_eq!(conn.transport().closed, 1);
        assert!(matches!(conn.take_error(), Some(Error::Transport(_))));
    }

    #[test]
    fn liveness() {
        let _ = env_logger::builder().is_test(true).try_init();

        // unanswered
        let mut conn = open(Config::default());
        conn.send_ping(Some(&b"probe"[..])).unwrap();
        assert_eq!(conn.pending_pings(), 1);

        let later = Instant::now() + Duration::from_secs(11);
        conn.tick(later);
        conn.tick(later + Duration::from_secs(5));
        assert_eq!(conn.handler().events, vec![Event::Liveness(b"probe".to_vec())]);
        assert_eq!(conn.state(), State::Open);

        // answered
        let mut conn = open(Config::default());
        conn.send_ping(None).unwrap();
        let ping = written_frames(&conn).remove(0);
        assert_eq!(ping.opcode(), OpCode::Ping);
        assert_eq!(ping.payload.len(), 8);

        conn.on_data(&server_frame(Fin::Y, OpCode::Pong, &ping.payload));
        conn.tick(Instant::now() + Duration::from_secs(11));
        assert_eq!(conn.pending_pings(), 0);
        assert_eq!(conn.handler().events, vec![Event::Pong(ping.payload.clone())]);
        assert_eq!(conn.handler().count(|e| matches!(e, Event::Liveness(_))), 0);

        // unsolicited pong
        conn.on_data(&server_frame(Fin::Y, OpCode::Pong, b"who"));
        assert_eq!(conn.handler().events.last(), Some(&Event::Pong(b"who".to_vec())));
        assert_eq!(conn.state(), State::Open);
    }

    #[test]
    fn liveness_close() {
        let mut config = Config::default();
        config.close_on_liveness_failure = true;
        let mut conn = open(config);
        conn.send_ping(Some(&b"a"[..])).unwrap();
        conn.tick(Instant::now() + Duration::from_secs(11));

        assert_eq!(conn.state(), State::Closing);
        let frames = written_frames(&conn);
        assert_eq!(frames.last().map(|f| f.opcode()), Some(OpCode::Close));
        assert_eq!(frames.last().map(|f| f.payload.clone()), Some(b"\x03\xe9".to_vec()));
    }

    #[test]
    fn keepalive() {
        let mut config = Config::default();
        config.ping_interval = Some(Duration::from_secs(30));
        let mut conn = open(config);

        conn.tick(Instant::now());
        assert!(written_frames(&conn).is_empty());

        conn.tick(Instant::now() + Duration::from_secs(31));
        let frames = written_frames(&conn);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].opcode(), OpCode::Ping);
        assert_eq!(conn.pending_pings(), 1);
    }

    #[test]
    fn close_timeout() {
        let mut conn = open(Config::default());
        conn.close(1000, "bye").unwrap();
        assert_eq!(conn.state(), State::Closing);

        conn.tick(Instant::now());
        assert_eq!(conn.state(), State::Closing);

        conn.tick(Instant::now() + Duration::from_secs(6));
        assert_eq!(conn.state(), State::Closed);
        assert_eq!(conn.handler().closed(), vec![&CloseInfo::abnormal()]);
        assert_eq!(conn.transport().closed, 1);
    }
}
